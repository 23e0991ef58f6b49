//! Black-box tests: boot the real router on an ephemeral port and drive it
//! through the `sigil-rpc` typed client, exactly like a gateway would.

use std::sync::Arc;

use sigil_api::app::{AppState, build_router};
use sigil_auth::{AuthService, token};
use sigil_rpc::proto::{LoginRequest, RegisterRequest};
use sigil_rpc::{AuthClient, ClientConfig, Code, RpcClient, connect};
use sigil_storage::MemoryStore;

const APP_SECRET: &str = "test-secret";

struct TestServer {
    address: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        store.seed_defaults().await.unwrap();
        store
            .insert_application("test-app", APP_SECRET)
            .await
            .unwrap();

        let auth = Arc::new(AuthService::new(store, chrono::Duration::hours(1)));
        let app = build_router(AppState { auth });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let address = listener.local_addr().unwrap().to_string();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { address, handle }
    }

    fn client(&self) -> RpcClient<AuthClient> {
        let cfg = ClientConfig {
            address: self.address.clone(),
            timeout_ms: 2_000,
            retries: 3,
            insecure: true,
        };
        connect(&cfg, AuthClient::new).expect("failed to build client")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "Secret123!".to_string(),
        first_name: "A".to_string(),
        last_name: "B".to_string(),
        middle_name: "C".to_string(),
    }
}

#[tokio::test]
async fn register_then_login_happy_path() {
    let server = TestServer::spawn().await;
    let client = server.client();

    let reg = client
        .api
        .register(&register_request("a@x.com"))
        .await
        .unwrap();
    assert!(reg.user_id > 0);

    let login = client
        .api
        .login(&LoginRequest {
            email: "a@x.com".to_string(),
            password: "Secret123!".to_string(),
            app_id: 1,
        })
        .await
        .unwrap();

    let claims = token::decode(&login.token, APP_SECRET).unwrap();
    assert_eq!(claims.sub, reg.user_id);
    assert_eq!(claims.email, "a@x.com");
    assert_eq!(claims.role, "student");
    assert!(!claims.scope.is_empty());

    client.close().unwrap();
}

#[tokio::test]
async fn duplicate_registration_is_already_exists() {
    let server = TestServer::spawn().await;
    let client = server.client();

    client
        .api
        .register(&register_request("dup@x.com"))
        .await
        .unwrap();

    let err = client
        .api
        .register(&register_request("dup@x.com"))
        .await
        .unwrap_err();

    assert_eq!(err.code, Code::AlreadyExists);
    assert!(err.message.contains("user already exists"));
}

#[tokio::test]
async fn wrong_password_is_unauthenticated() {
    let server = TestServer::spawn().await;
    let client = server.client();

    client
        .api
        .register(&register_request("b@x.com"))
        .await
        .unwrap();

    let err = client
        .api
        .login(&LoginRequest {
            email: "b@x.com".to_string(),
            password: "wrong".to_string(),
            app_id: 1,
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, Code::Unauthenticated);
    // Anti-enumeration: the message must not say which field was wrong.
    assert!(!err.message.contains("password is wrong"));
}

#[tokio::test]
async fn unknown_app_id_is_invalid_argument_regardless_of_credentials() {
    let server = TestServer::spawn().await;
    let client = server.client();

    client
        .api
        .register(&register_request("c@x.com"))
        .await
        .unwrap();

    let err = client
        .api
        .login(&LoginRequest {
            email: "c@x.com".to_string(),
            password: "Secret123!".to_string(),
            app_id: 999,
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, Code::InvalidArgument);
}

#[tokio::test]
async fn request_validation_rejections() {
    let server = TestServer::spawn().await;
    let client = server.client();

    let cases = [
        (
            RegisterRequest {
                email: String::new(),
                ..register_request("x@x.com")
            },
            "email is required",
        ),
        (
            RegisterRequest {
                password: String::new(),
                ..register_request("x@x.com")
            },
            "password is required",
        ),
        (
            RegisterRequest {
                first_name: String::new(),
                ..register_request("x@x.com")
            },
            "first_name is required",
        ),
        (
            RegisterRequest {
                last_name: String::new(),
                ..register_request("x@x.com")
            },
            "last_name is required",
        ),
    ];

    for (request, expected) in cases {
        let err = client.api.register(&request).await.unwrap_err();
        assert_eq!(err.code, Code::InvalidArgument);
        assert_eq!(err.message, expected);
    }

    let err = client
        .api
        .login(&LoginRequest {
            email: "x@x.com".to_string(),
            password: "pw".to_string(),
            app_id: 0,
        })
        .await
        .unwrap_err();
    assert_eq!(err.message, "app_id is required");
}

#[tokio::test]
async fn closed_client_rejects_further_calls() {
    let server = TestServer::spawn().await;
    let client = server.client();

    client.close().unwrap();

    let err = client
        .api
        .login(&LoginRequest {
            email: "a@x.com".to_string(),
            password: "pw".to_string(),
            app_id: 1,
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, Code::Cancelled);
    assert!(client.close().is_err());
}
