use crate::helpers::TestApi;
use reqwest::StatusCode;

#[tokio::test]
async fn ping_works() {
    let api = TestApi::spawn().await;

    let response = api.get_ping().await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn the_root_redirects_to_the_article_list() {
    let api = TestApi::spawn().await;

    let response = api.get("/").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "/articles");
}

#[tokio::test]
async fn unknown_paths_return_404() {
    let api = TestApi::spawn().await;

    let response = api.get("/not/a/route").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn unsupported_methods_return_405() {
    let api = TestApi::spawn().await;

    let response = api
        .api_client
        .put(format!("{}/articles/1/edit", api.api_address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["allow"], "GET,POST");
}
