use std::env;

use once_cell::sync::OnceCell;

static DEBUG: OnceCell<bool> = OnceCell::new();
static SECRET: OnceCell<String> = OnceCell::new();

fn env_bool<T: AsRef<str>>(s: T) -> bool {
    let s = s.as_ref().trim();
    !(s.is_empty() || s == "0" || s.to_ascii_lowercase() == "false")
}

pub fn debug() -> bool {
    *DEBUG.get_or_init(|| env::var("DEBUG").map(env_bool).unwrap_or(false))
}

pub fn secret() -> &'static str {
    SECRET.get_or_init(|| env::var("SECRET").expect("A SECRET environment variable must be set"))
}

pub fn port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(3001)
}

pub async fn init() {
    crate::database::init().await;
}
