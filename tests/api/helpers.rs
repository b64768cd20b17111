use fake::faker::internet::en::{Password, SafeEmail};
use fake::faker::name::en::Name;
use fake::Fake;
use horizon_signup::authentication::hash_password;
use horizon_signup::configuration::Settings;
use horizon_signup::startup::Application;
use horizon_signup::storage::InMemoryStore;
use horizon_signup::telemetry::init_test_tracing;
use once_cell::sync::Lazy;
use secrecy::Secret;
use std::sync::Arc;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestApp {
    pub addr: String,
    pub port: u16,
    pub store: Arc<InMemoryStore>,
    pub email_server: MockServer,
    pub admin: TestAdmin,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_subscriptions(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/subscriptions", self.addr))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_raw_subscriptions(&self, body: &str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/subscriptions", self.addr))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_confirm(&self, query: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}/subscriptions/confirm{}", self.addr, query))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Follows a link from an email, pointed at the test server.
    pub async fn follow_link(&self, link: &str) -> reqwest::Response {
        let mut link = reqwest::Url::parse(link).unwrap();
        assert_eq!(link.host_str().unwrap(), "127.0.0.1");
        link.set_port(Some(self.port)).unwrap();
        self.api_client
            .get(link)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_unsubscribe(&self, email: &str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/unsubscribe", self.addr))
            .form(&[("email", email)])
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_login<Body: serde::Serialize>(&self, body: &Body) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/login", self.addr))
            .form(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login_as_admin(&self) -> reqwest::Response {
        self.post_login(&serde_json::json!({
            "username": &self.admin.username,
            "password": &self.admin.password,
        }))
        .await
    }

    pub async fn get_login_html(&self) -> String {
        self.api_client
            .get(&format!("{}/login", self.addr))
            .send()
            .await
            .expect("Failed to execute request")
            .text()
            .await
            .unwrap()
    }

    pub async fn get_campaigns(&self) -> reqwest::Response {
        self.api_client
            .get(&format!("{}/admin/campaigns", self.addr))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_campaigns_html(&self) -> String {
        self.get_campaigns().await.text().await.unwrap()
    }

    pub async fn post_campaign<Body: serde::Serialize>(&self, body: &Body) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/admin/campaigns", self.addr))
            .form(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_logout(&self) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/admin/logout", self.addr))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_api_login(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/api/login", self.addr))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn api_token(&self) -> String {
        let body: serde_json::Value = self
            .post_api_login(&serde_json::json!({
                "username": &self.admin.username,
                "password": &self.admin.password,
            }))
            .await
            .json()
            .await
            .unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn get_api(&self, endpoint: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.api_client.get(&format!("{}/api/{}", self.addr, endpoint));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request")
    }

    /// Subscribes and returns the confirmation link sent to `body["email"]`.
    pub async fn create_unconfirmed_subscriber(&self, body: &serde_json::Value) -> String {
        let _scoped_mock = Mock::given(path("/email"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .named("Confirmation and admin notification")
            .expect(2)
            .mount_as_scoped(&self.email_server)
            .await;

        self.post_subscriptions(body)
            .await
            .error_for_status()
            .unwrap();

        let email = body["email"].as_str().unwrap();
        let requests = self.email_server.received_requests().await.unwrap();
        let confirmation = requests
            .iter()
            .rev()
            .find(|request| email_body(request)["To"] == email)
            .expect("No email was sent to the subscriber");
        confirmation_link(confirmation)
    }

    pub async fn create_confirmed_subscriber(&self, body: &serde_json::Value) {
        let link = self.create_unconfirmed_subscriber(body).await;

        let _scoped_mock = Mock::given(path("/email"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .named("Welcome email")
            .expect(1)
            .mount_as_scoped(&self.email_server)
            .await;

        self.follow_link(&link).await.error_for_status().unwrap();
    }
}

pub fn subscriber_body() -> serde_json::Value {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    serde_json::json!({
        "name": name,
        "email": format!("{}.{}", Uuid::new_v4().simple(), email),
        "phone": "+44 20 7946 0000",
        "intention": "rider",
    })
}

pub fn email_body(request: &wiremock::Request) -> serde_json::Value {
    serde_json::from_slice(&request.body).unwrap()
}

pub fn confirmation_link(request: &wiremock::Request) -> String {
    let body = email_body(request);
    let links: Vec<_> = linkify::LinkFinder::new()
        .links(body["TextBody"].as_str().unwrap())
        .filter(|l| *l.kind() == linkify::LinkKind::Url)
        .map(|l| l.as_str().to_owned())
        .filter(|l| l.contains("/subscriptions/confirm"))
        .collect();
    assert_eq!(links.len(), 1);
    links[0].clone()
}

pub fn assert_redirects_to(response: &reqwest::Response, location: &str) {
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers().get("Location").unwrap(), location);
}

static TRACING: Lazy<()> = Lazy::new(|| init_test_tracing("test_app"));

pub async fn spawn_app() -> TestApp {
    // Lazy mean only run when it is called
    // once_cell make sure it is only run once on entire program lifetime
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;
    let admin = TestAdmin::generate();

    let settings = {
        let mut settings = Settings::get_configuration().expect("Failed to read configuration");

        // Use port 0 to ask the OS to pick a random free port
        settings.application.port = 0;
        settings.application.base_url = "http://127.0.0.1".into();
        settings.email_client.api_base_url = email_server.uri();
        settings.admin.username = admin.username.clone();
        settings.admin.password_hash = Secret::new(admin.password_hash());
        settings
    };

    let store = Arc::new(InMemoryStore::new());
    let app = Application::build(settings, store.clone())
        .await
        .expect("Failed to build the application");
    let port = app.port();
    let addr = format!("http://127.0.0.1:{}", port);

    tokio::spawn(app.run_until_terminated());

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true)
        .build()
        .unwrap();

    TestApp {
        addr,
        port,
        store,
        email_server,
        admin,
        api_client,
    }
}

pub struct TestAdmin {
    pub username: String,
    pub password: String,
}

impl TestAdmin {
    pub fn generate() -> Self {
        Self {
            username: Uuid::new_v4().to_string(),
            password: Password(12..24).fake(),
        }
    }

    fn password_hash(&self) -> String {
        hash_password(&self.password).expect("Failed to hash the admin password")
    }
}
