use reqwest::StatusCode;

use crate::helpers::{TestApi, location};

#[tokio::test]
async fn a_valid_submission_creates_an_article() {
    let api = TestApi::spawn().await;

    let response = api
        .post_form(
            "/articles",
            &[("title", "Hello"), ("author", "Ada"), ("body", "First post")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let article_path = location(&response);
    let id = article_path
        .strip_prefix("/articles/")
        .expect("Unexpected redirect target");
    assert!(id.parse::<i64>().is_ok(), "`{id}` is not a generated id");

    let html = api.get_html(&article_path).await;
    assert!(html.contains("<title>Hello</title>"));
    assert!(html.contains("By Ada on "));
    assert!(html.contains("First post"));
}

#[tokio::test]
async fn the_author_defaults_to_julian() {
    let api = TestApi::spawn().await;

    let response = api
        .post_form("/articles", &[("title", "Hello"), ("body", "First post")])
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let html = api.get_html(&location(&response)).await;
    assert!(html.contains("By Julian on "));
}

#[tokio::test]
async fn invalid_submissions_are_not_persisted() {
    let api = TestApi::spawn().await;
    let cases = [
        (
            [("title", ""), ("author", "Ada"), ("body", "Text")],
            "Please provide a title.",
        ),
        (
            [("title", "Title"), ("author", ""), ("body", "Text")],
            "Please provide an author.",
        ),
        (
            [("title", "Title"), ("author", "Ada"), ("body", "")],
            "Please provide some text.",
        ),
    ];

    for (form, message) in cases {
        let response = api.post_form("/articles", &form).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = response.text().await.unwrap();
        assert!(html.contains(message), "Missing `{message}`");
        assert!(html.contains("<title>New Article</title>"));
    }

    let html = api.get_html("/articles").await;
    assert!(html.contains("No articles yet."));
}

#[tokio::test]
async fn html_is_escaped() {
    let api = TestApi::spawn().await;

    let article_path = api
        .create_article("<script>alert(1)</script>", "Ada", "a & b")
        .await;

    let html = api.get_html(&article_path).await;
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(html.contains("a &amp; b"));
}

#[tokio::test]
async fn responses_are_html() {
    let api = TestApi::spawn().await;

    let response = api.get("/articles/new").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/html; charset=utf-8"
    );
}

#[tokio::test]
async fn unknown_ids_return_404() {
    let api = TestApi::spawn().await;

    for path in [
        "/articles/42",
        "/articles/42/edit",
        "/articles/42/delete",
        "/articles/not-a-number",
    ] {
        let response = api.get(path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {path}");
        assert!(response.text().await.unwrap().is_empty());
    }

    let response = api
        .post_form("/articles/42/edit", &[("title", "Edited")])
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = api.post_form("/articles/42/delete", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn the_listing_shows_the_newest_articles_first() {
    let api = TestApi::spawn().await;
    api.create_article("First", "Ada", "One").await;
    api.create_article("Second", "Ada", "Two").await;
    api.create_article("Third", "Ada", "Three").await;

    let html = api.get_html("/articles").await;

    let position = |title: &str| {
        html.find(&format!(">{title}</a>"))
            .unwrap_or_else(|| panic!("`{title}` is not listed"))
    };
    assert!(position("Third") < position("Second"));
    assert!(position("Second") < position("First"));
    assert!(html.contains("<title>simpleBlog!</title>"));
}

#[tokio::test]
async fn the_listing_shows_a_short_description() {
    let api = TestApi::spawn().await;
    let body = "x".repeat(201);
    api.create_article("Long", "Ada", &body).await;

    let html = api.get_html("/articles").await;

    assert!(html.contains(&format!("<p>{}...</p>", "x".repeat(200))));
    assert!(!html.contains(&body));
}

#[tokio::test]
async fn a_valid_edit_only_changes_the_target_article() {
    let api = TestApi::spawn().await;
    let first = api.create_article("First", "Ada", "One").await;
    let second = api.create_article("Second", "Grace", "Two").await;

    let html = api.get_html(&format!("{first}/edit")).await;
    assert!(html.contains("<title>Edit Article</title>"));
    assert!(html.contains(r#"value="First""#));

    let response = api
        .post_form(&format!("{first}/edit"), &[("title", "First, edited")])
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), first);

    let html = api.get_html(&first).await;
    assert!(html.contains("<title>First, edited</title>"));
    // Fields missing from the submission are left untouched.
    assert!(html.contains("By Ada on "));
    assert!(html.contains("One"));

    let html = api.get_html(&second).await;
    assert!(html.contains("<title>Second</title>"));
}

#[tokio::test]
async fn an_invalid_edit_changes_nothing() {
    let api = TestApi::spawn().await;
    let article = api.create_article("Title", "Ada", "Body").await;

    let response = api
        .post_form(
            &format!("{article}/edit"),
            &[("title", "New title"), ("author", "Grace"), ("body", "")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("Please provide some text."));
    assert!(html.contains(&format!(r#"action="{article}/edit""#)));
    assert!(html.contains(r#"value="New title""#));

    let html = api.get_html(&article).await;
    assert!(html.contains("<title>Title</title>"));
    assert!(html.contains("By Ada on "));
}

#[tokio::test]
async fn deleted_articles_are_gone() {
    let api = TestApi::spawn().await;
    let article = api.create_article("Doomed", "Ada", "Body").await;

    let html = api.get_html(&format!("{article}/delete")).await;
    assert!(html.contains("<title>Delete Article</title>"));
    assert!(html.contains("Doomed"));

    let response = api.post_form(&format!("{article}/delete"), &[]).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/articles");

    let response = api.get(&article).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = api.post_form(&format!("{article}/delete"), &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn forms_must_be_url_encoded() {
    let api = TestApi::spawn().await;

    let response = api
        .api_client
        .post(format!("{}/articles", api.api_address))
        .header("content-type", "text/plain")
        .body("title=Hello")
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_client_error());
}
