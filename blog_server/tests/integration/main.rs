mod articles;
mod helpers;
mod ping;
