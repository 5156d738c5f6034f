//! Compile-time behaviour: paths, verbs and configuration errors.

use hermes_core::Verb;
use hermes_dispatch::{Application, Bundle, CompileError, Controller, Declaration, DispatchSettings, EndpointDescriptor};
use hermes_extract::ParamBinding;
use hermes_middleware::{BoxedMiddleware, MiddlewareGenerator, MiddlewareOptions};
use serde_json::json;
use std::sync::Arc;

struct Inferred;

fn ok(name: &str, path: &str) -> EndpointDescriptor<Inferred> {
    EndpointDescriptor::new(name, path, |_ctrl, _args| async { Ok(()) })
}

impl Controller for Inferred {
    fn declare(meta: &mut Declaration<'_, Self>) {
        meta.base_path("/items");
        for name in ["getAll", "list", "updateOne", "deleteOne", "createOne", "other"] {
            meta.endpoint(ok(name, &format!("/{name}")));
        }
        meta.endpoint(ok("replace", "/replace").verb(Verb::Put));
    }
}

#[test]
fn verbs_are_inferred_from_sub_paths() {
    let mut app = Application::new();
    app.mount(Arc::new(Inferred)).unwrap();

    let routes: Vec<(Verb, String)> = app
        .routes()
        .map(|r| (r.verb, r.full_path.clone()))
        .collect();
    assert_eq!(
        routes,
        vec![
            (Verb::Get, "/items/getAll".to_string()),
            (Verb::Get, "/items/list".to_string()),
            (Verb::Patch, "/items/updateOne".to_string()),
            (Verb::Delete, "/items/deleteOne".to_string()),
            (Verb::Post, "/items/createOne".to_string()),
            (Verb::Post, "/items/other".to_string()),
            (Verb::Put, "/items/replace".to_string()),
        ]
    );
}

struct Slashy;

impl Controller for Slashy {
    fn declare(meta: &mut Declaration<'_, Self>) {
        meta.base_path("users//").endpoint(
            EndpointDescriptor::new("get_user", "//:id/", |_ctrl, _args| async { Ok(()) })
                .verb(Verb::Get),
        );
    }
}

#[test]
fn full_paths_join_mount_prefix_base_and_sub_path() {
    let mut app = Application::with_settings(DispatchSettings {
        mount_path: "/api/".to_string(),
        ..DispatchSettings::default()
    });
    app.mount_bundle(Bundle::new("people").prefix("v1").controller(Arc::new(Slashy)))
        .unwrap();

    let route = app.routes().next().unwrap();
    assert_eq!(route.full_path, "/api/v1/users/:id");
    assert_eq!(route.bundle.as_deref(), Some("people"));
    assert_eq!(route.to_string(), "GET    /api/v1/users/:id -> Slashy.get_user");
}

struct Baseless;

impl Controller for Baseless {
    fn declare(meta: &mut Declaration<'_, Self>) {
        meta.endpoint(EndpointDescriptor::new("list", "/list", |_ctrl, _args| async {
            Ok(())
        }));
    }
}

#[test]
fn missing_base_path_registers_nothing() {
    let mut app = Application::new();
    let err = app.mount(Arc::new(Baseless)).unwrap_err();
    assert!(matches!(err, CompileError::MissingBasePath { ref controller } if controller == "Baseless"));
    assert_eq!(app.routes().count(), 0);
}

struct Healthy;

impl Controller for Healthy {
    fn declare(meta: &mut Declaration<'_, Self>) {
        meta.base_path("/health").endpoint(
            EndpointDescriptor::new("get_status", "/", |_ctrl, _args| async { Ok("ok") })
                .verb(Verb::Get),
        );
    }
}

struct Malformed;

impl Controller for Malformed {
    fn declare(meta: &mut Declaration<'_, Self>) {
        meta.base_path("/broken").endpoint(
            EndpointDescriptor::new("get_one", "/{id", |_ctrl, _args| async { Ok(()) })
                .verb(Verb::Get),
        );
    }
}

#[test]
fn malformed_path_aborts_the_whole_bundle() {
    let mut app = Application::new();
    let bundle = Bundle::new("ops")
        .controller(Arc::new(Healthy))
        .controller(Arc::new(Malformed));
    let err = app.mount_bundle(bundle).unwrap_err();

    match err {
        CompileError::MalformedPath {
            controller, member, ..
        } => {
            assert_eq!(controller, "Malformed");
            assert_eq!(member, "get_one");
        }
        other => panic!("expected MalformedPath, got {other:?}"),
    }
    assert_eq!(app.routes().count(), 0);
}

#[test]
fn route_conflicts_abort_the_bundle() {
    let mut app = Application::new();
    app.mount(Arc::new(Healthy)).unwrap();

    struct Shadow;

    impl Controller for Shadow {
        fn declare(meta: &mut Declaration<'_, Self>) {
            meta.base_path("/health").endpoint(
                EndpointDescriptor::new("get_again", "", |_ctrl, _args| async { Ok(()) })
                    .verb(Verb::Get),
            );
        }
    }

    let err = app
        .mount_bundle(Bundle::new("late").controller(Arc::new(Shadow)))
        .unwrap_err();
    assert!(matches!(err, CompileError::Route(_)));
    assert_eq!(app.routes().count(), 1);
}

struct Misbound;

impl Controller for Misbound {
    fn declare(meta: &mut Declaration<'_, Self>) {
        meta.base_path("/misbound")
            .endpoint(EndpointDescriptor::new("list", "/list", |_ctrl, _args| async { Ok(()) }))
            .bind("lsit", ParamBinding::query(0, "page"));
    }
}

#[test]
fn metadata_on_unknown_members_is_rejected() {
    let err = Application::new().mount(Arc::new(Misbound)).unwrap_err();
    match err {
        CompileError::UnknownMember { member, what, .. } => {
            assert_eq!(member, "lsit");
            assert_eq!(what, "binding");
        }
        other => panic!("expected UnknownMember, got {other:?}"),
    }
}

struct Doubled;

impl Controller for Doubled {
    fn declare(meta: &mut Declaration<'_, Self>) {
        meta.base_path("/doubled")
            .endpoint(EndpointDescriptor::new("list", "/list", |_ctrl, _args| async { Ok(()) }))
            .bind("list", ParamBinding::query(0, "page"))
            .bind("list", ParamBinding::query(0, "size"));
    }
}

#[test]
fn duplicate_binding_is_a_configuration_error() {
    let err = Application::new().mount(Arc::new(Doubled)).unwrap_err();
    assert!(matches!(err, CompileError::DuplicateBinding { index: 0, .. }));
    assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
}

struct Optioned;

impl Controller for Optioned {
    fn declare(meta: &mut Declaration<'_, Self>) {
        meta.base_path("/optioned")
            .endpoint(EndpointDescriptor::new("list", "/list", |_ctrl, _args| async { Ok(()) }))
            .endpoint_option("list", "rate", json!({ "per_minute": "lots" }));
    }
}

struct Strict;

impl MiddlewareGenerator for Strict {
    fn identifiers(&self) -> Vec<String> {
        vec!["rate".to_string()]
    }

    fn middleware(
        &self,
        _controller: &MiddlewareOptions,
        endpoint: &MiddlewareOptions,
    ) -> anyhow::Result<Vec<BoxedMiddleware>> {
        for value in endpoint.get("rate") {
            if !value["per_minute"].is_u64() {
                anyhow::bail!("per_minute must be a number");
            }
        }
        Ok(Vec::new())
    }
}

#[test]
fn generator_errors_fail_compilation() {
    let mut app = Application::new().with_generator(Strict);
    let err = app.mount(Arc::new(Optioned)).unwrap_err();
    match err {
        CompileError::Generator {
            controller,
            member,
            message,
        } => {
            assert_eq!(controller, "Optioned");
            assert_eq!(member, "list");
            assert!(message.contains("per_minute"));
        }
        other => panic!("expected Generator, got {other:?}"),
    }
    assert_eq!(app.routes().count(), 0);
}

#[test]
fn options_without_a_generator_still_compile() {
    let mut app = Application::new();
    app.mount(Arc::new(Optioned)).unwrap();
    assert!(app.routes().next().unwrap().middleware.is_empty());
}
