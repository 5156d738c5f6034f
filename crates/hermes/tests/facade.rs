//! The facade's startup path.

use hermes::prelude::*;
use hermes::HermesError;
use std::sync::Arc;

struct Ping;

impl Controller for Ping {
    fn declare(meta: &mut Declaration<'_, Self>) {
        meta.base_path("/ping").endpoint(
            EndpointDescriptor::new("get_ping", "/", |_ctrl, _args| async { Ok("pong") })
                .verb(Verb::Get),
        );
    }
}

fn quiet_config() -> HermesConfig {
    ConfigLoader::new()
        .with_string(
            r#"
            [dispatch]
            mount_path = "/api"

            [server]
            http_addr = "127.0.0.1:0"
            shutdown_timeout_secs = 1

            [logging]
            enabled = false
            "#,
            "toml",
        )
        .unwrap()
        .load()
        .unwrap()
}

#[tokio::test]
async fn bootstrap_applies_dispatch_settings() {
    let config = quiet_config();
    let mut app = hermes::bootstrap(&config).unwrap();
    app.mount(Arc::new(Ping)).unwrap();

    let response = app.handle(Request::builder().uri("/api/ping").build()).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn serve_until_returns_after_shutdown() {
    let config = quiet_config();
    let mut app = hermes::bootstrap(&config).unwrap();
    app.mount(Arc::new(Ping)).unwrap();

    let shutdown = ShutdownSignal::new();
    shutdown.trigger();
    hermes::serve_until(app, &config, shutdown).await.unwrap();
}

#[test]
fn compile_errors_convert() {
    struct Nowhere;

    impl Controller for Nowhere {
        fn declare(_meta: &mut Declaration<'_, Self>) {}
    }

    let err: HermesError = Application::new()
        .mount(Arc::new(Nowhere))
        .unwrap_err()
        .into();
    assert!(matches!(err, HermesError::Compile(_)));
    assert_eq!(err.to_string(), "controller Nowhere has no base path");
}
