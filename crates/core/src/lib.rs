pub mod catalog;
pub mod domain;
pub mod payload;
pub mod sim;
pub mod storage;

pub mod config {
    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub static_dir: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                static_dir: std::env::var("STATIC_DIR").ok(),
            })
        }
    }
}
