//! Common test utilities and fixtures.
//!
//! [`TestEnv`] starts one axum server per test that plays both the hosted
//! user pool (`POST /cognito`, JSON protocol keyed by `X-Amz-Target`) and the
//! REST backend. Backend routes require a bearer token issued by the fake
//! pool, count their hits and can be told to fail.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, Request, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use merida_api::dto::{
    CreateFacility, CreateIrrigation, CreatePlot, CreateSpecies, Facility, IrrigationEvent, PlotMetadata, PlotState,
    Species, UpdateFacility, UpdatePlot, UpdateUser, User,
};
use merida_api::{ApiClient, Queries, QueryCache};
use merida_auth::{CognitoProvider, FileStore, IdentityGateway, MemoryStore, SessionManager};
use merida_core::Config;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Default test account.
pub const GROWER: &str = "grower@example.com";
/// Password of the default test account.
pub const PASSWORD: &str = "Secret-123";

pub type Shared = Arc<Mutex<World>>;
pub type Manager = Arc<SessionManager<CognitoProvider>>;

type IdpResult = Result<Value, (&'static str, String)>;

struct Account {
    password: String,
    sub: String,
    attributes: BTreeMap<String, String>,
    required: Option<Vec<String>>,
}

/// State behind the fake servers.
#[derive(Default)]
pub struct World {
    accounts: HashMap<String, Account>,
    challenges: HashMap<String, String>,
    tokens: HashMap<String, String>,
    serial: u64,
    hits: HashMap<String, usize>,
    failures: HashMap<String, VecDeque<u16>>,
    /// Identity operations received, as `Operation:username`.
    pub idp_calls: Vec<String>,
    /// Responses of the last answered challenge.
    pub challenge_responses: BTreeMap<String, String>,
    /// Query parameters of the last history request.
    pub history_query: HashMap<String, String>,
    pub facilities: Vec<Facility>,
    pub plots: Vec<PlotMetadata>,
    pub species: Vec<Species>,
    pub irrigations: HashMap<String, Vec<IrrigationEvent>>,
    pub users: HashMap<String, User>,
}

impl World {
    fn next(&mut self) -> u64 {
        self.serial += 1;
        self.serial
    }

    /// Revokes every token of `username`, as a sign-out elsewhere would.
    pub fn tokens_revoked_for(&mut self, username: &str) {
        self.tokens.retain(|_, owner| owner.as_str() != username);
    }

    fn issue_tokens(&mut self, username: &str) -> IdpResult {
        let n = self.next();
        let (sub, email) = match self.accounts.get(username) {
            Some(account) => (account.sub.clone(), account.attributes.get("email").cloned()),
            None => return Err(("UserNotFoundException", "User does not exist.".to_string())),
        };
        let access = format!("access-{username}-{n}");
        self.tokens.insert(access.clone(), username.to_string());

        let mut claims = json!({ "sub": sub, "cognito:username": username, "exp": 4_102_444_800_i64 });
        if let Some(email) = email {
            claims["email"] = json!(email);
        }
        let id_token = format!(
            "{}.{}.c2ln",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        );
        Ok(json!({
            "AuthenticationResult": {
                "AccessToken": access,
                "IdToken": id_token,
                "RefreshToken": format!("refresh-{username}"),
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            }
        }))
    }

    fn initiate_auth(&mut self, request: &Value) -> IdpResult {
        let username = text_at(request, "/AuthParameters/USERNAME");
        let password = text_at(request, "/AuthParameters/PASSWORD");
        self.idp_calls.push(format!("InitiateAuth:{username}"));

        let (required, existing) = match self.accounts.get(&username) {
            None => return Err(("UserNotFoundException", "User does not exist.".to_string())),
            Some(account) if account.password != password => {
                return Err(("NotAuthorizedException", "Incorrect username or password.".to_string()))
            }
            Some(account) => (account.required.clone(), account.attributes.clone()),
        };

        let Some(required) = required else {
            return self.issue_tokens(&username);
        };
        let session = format!("challenge-{}", self.next());
        self.challenges.insert(session.clone(), username.clone());
        let required: Vec<String> = required.iter().map(|a| format!("userAttributes.{a}")).collect();
        Ok(json!({
            "ChallengeName": "NEW_PASSWORD_REQUIRED",
            "Session": session,
            "ChallengeParameters": {
                "USER_ID_FOR_SRP": username,
                "requiredAttributes": serde_json::to_string(&required).unwrap_or_default(),
                "userAttributes": serde_json::to_string(&existing).unwrap_or_default()
            }
        }))
    }

    fn respond_to_challenge(&mut self, request: &Value) -> IdpResult {
        let session = text_at(request, "/Session");
        let responses: BTreeMap<String, String> = request
            .get("ChallengeResponses")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        let username = responses.get("USERNAME").cloned().unwrap_or_default();
        self.idp_calls.push(format!("RespondToAuthChallenge:{username}"));
        self.challenge_responses = responses.clone();

        match self.challenges.remove(&session) {
            Some(owner) if owner == username => {}
            _ => {
                return Err((
                    "NotAuthorizedException",
                    "Invalid session for the user, session is expired.".to_string(),
                ))
            }
        }
        let new_password = responses.get("NEW_PASSWORD").cloned().unwrap_or_default();
        if new_password.len() < 8 {
            self.challenges.insert(session, username);
            return Err(("InvalidPasswordException", "Password does not conform to policy".to_string()));
        }

        let Some(account) = self.accounts.get_mut(&username) else {
            return Err(("UserNotFoundException", "User does not exist.".to_string()));
        };
        let missing: Vec<String> = account
            .required
            .iter()
            .flatten()
            .filter(|a| {
                responses
                    .get(&format!("userAttributes.{a}"))
                    .map_or(true, |v| v.trim().is_empty())
            })
            .cloned()
            .collect();
        if !missing.is_empty() {
            self.challenges.insert(session, username);
            return Err(("InvalidParameterException", format!("missing required attributes: {missing:?}")));
        }

        for (name, value) in &responses {
            if let Some(attribute) = name.strip_prefix("userAttributes.") {
                account.attributes.insert(attribute.to_string(), value.clone());
            }
        }
        account.password = new_password;
        account.required = None;
        self.issue_tokens(&username)
    }

    fn get_user(&mut self, request: &Value) -> IdpResult {
        let token = text_at(request, "/AccessToken");
        self.idp_calls.push("GetUser".to_string());
        let account = self
            .tokens
            .get(&token)
            .and_then(|username| self.accounts.get(username).map(|a| (username, a)));
        let Some((username, account)) = account else {
            return Err(("NotAuthorizedException", "Access Token has been revoked".to_string()));
        };

        let mut attributes = vec![json!({ "Name": "sub", "Value": account.sub })];
        attributes.extend(
            account
                .attributes
                .iter()
                .map(|(name, value)| json!({ "Name": name, "Value": value })),
        );
        Ok(json!({ "Username": username, "UserAttributes": attributes }))
    }

    fn global_sign_out(&mut self, request: &Value) -> IdpResult {
        let token = text_at(request, "/AccessToken");
        let Some(username) = self.tokens.get(&token).cloned() else {
            self.idp_calls.push("GlobalSignOut:".to_string());
            return Err(("NotAuthorizedException", "Access Token has been revoked".to_string()));
        };
        self.idp_calls.push(format!("GlobalSignOut:{username}"));
        self.tokens.retain(|_, owner| *owner != username);
        Ok(json!({}))
    }
}

fn text_at(value: &Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// ============================================
// Fake user pool
// ============================================

async fn identity(State(world): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    let target = headers
        .get("x-amz-target")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let operation = target.rsplit('.').next().unwrap_or_default();
    let Ok(request) = serde_json::from_slice::<Value>(&body) else {
        return idp_error("SerializationException", "malformed request body");
    };

    let mut world = world.lock();
    let result = match operation {
        "InitiateAuth" => world.initiate_auth(&request),
        "RespondToAuthChallenge" => world.respond_to_challenge(&request),
        "GetUser" => world.get_user(&request),
        "GlobalSignOut" => world.global_sign_out(&request),
        other => Err(("InvalidAction", format!("unknown operation {other}"))),
    };
    match result {
        Ok(body) => Json(body).into_response(),
        Err((code, message)) => idp_error(code, &message),
    }
}

fn idp_error(code: &str, message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "__type": code, "message": message }))).into_response()
}

// ============================================
// Fake REST backend
// ============================================

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn reply<T: serde::Serialize>(value: T) -> Response {
    Json(value).into_response()
}

async fn gate(State(world): State<Shared>, request: Request, next: Next) -> Response {
    {
        let mut world = world.lock();
        let route = format!("{} {}", request.method(), request.uri().path());
        *world.hits.entry(route.clone()).or_default() += 1;

        if let Some(status) = world.failures.get_mut(&route).and_then(VecDeque::pop_front) {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return detail(status, "injected failure");
        }

        let token = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if !token.is_some_and(|t| world.tokens.contains_key(t)) {
            return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
        }
    }
    next.run(request).await
}

async fn list_facilities(State(world): State<Shared>) -> Response {
    let world = world.lock();
    reply(json!({ "count": world.facilities.len(), "facilities": world.facilities }))
}

async fn create_facility(State(world): State<Shared>, Json(body): Json<CreateFacility>) -> Response {
    let mut world = world.lock();
    let facility = Facility {
        facility_id: format!("fac-{}", world.next()),
        name: body.name,
        location: Some(body.location),
        created_at: Some("2024-05-01T00:00:00Z".to_string()),
    };
    world.facilities.push(facility.clone());
    reply(json!({ "message": "Facility created successfully", "facility": facility }))
}

async fn get_facility(State(world): State<Shared>, Path(id): Path<String>) -> Response {
    let world = world.lock();
    match world.facilities.iter().find(|f| f.facility_id == id) {
        Some(facility) => reply(facility),
        None => detail(StatusCode::NOT_FOUND, "Facility not found"),
    }
}

async fn update_facility(
    State(world): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<UpdateFacility>,
) -> Response {
    let mut world = world.lock();
    let Some(facility) = world.facilities.iter_mut().find(|f| f.facility_id == id) else {
        return detail(StatusCode::NOT_FOUND, "Facility not found");
    };
    if let Some(name) = body.name {
        facility.name = name;
    }
    if let Some(location) = body.location {
        facility.location = Some(location);
    }
    reply(json!({ "message": "Facility updated successfully", "updated_facility": facility }))
}

async fn delete_facility(State(world): State<Shared>, Path(id): Path<String>) -> Response {
    let mut world = world.lock();
    let before = world.facilities.len();
    world.facilities.retain(|f| f.facility_id != id);
    if world.facilities.len() == before {
        return detail(StatusCode::NOT_FOUND, "Facility not found");
    }
    world.plots.retain(|p| p.facility_id != id);
    reply(json!({ "message": "Facility deleted successfully" }))
}

async fn facility_plots(State(world): State<Shared>, Path(id): Path<String>) -> Response {
    let world = world.lock();
    let plots: Vec<&PlotMetadata> = world.plots.iter().filter(|p| p.facility_id == id).collect();
    reply(plots)
}

async fn user_plots(State(world): State<Shared>, Path(_user): Path<String>) -> Response {
    let world = world.lock();
    reply(json!({ "plots": world.plots }))
}

async fn create_plot(State(world): State<Shared>, Json(body): Json<CreatePlot>) -> Response {
    let mut world = world.lock();
    if !world.facilities.iter().any(|f| f.facility_id == body.facility_id) {
        return detail(StatusCode::NOT_FOUND, "Facility not found");
    }
    let plot = PlotMetadata {
        plot_id: format!("plot-{}", world.next()),
        facility_id: body.facility_id,
        name: body.name,
        location: body.location,
        species: body.species,
        area: body.area,
        mac_address: body.mac_address,
        created_at: Some("2024-05-01T00:00:00Z".to_string()),
        updated_at: None,
    };
    world.plots.push(plot.clone());
    reply(plot)
}

async fn get_plot(State(world): State<Shared>, Path(id): Path<String>) -> Response {
    let world = world.lock();
    match world.plots.iter().find(|p| p.plot_id == id) {
        Some(plot) => reply(plot),
        None => detail(StatusCode::NOT_FOUND, "Plot not found"),
    }
}

async fn update_plot(State(world): State<Shared>, Path(id): Path<String>, Json(body): Json<UpdatePlot>) -> Response {
    let mut world = world.lock();
    let Some(plot) = world.plots.iter_mut().find(|p| p.plot_id == id) else {
        return detail(StatusCode::NOT_FOUND, "Plot not found");
    };
    if body.name.is_some() {
        plot.name = body.name;
    }
    if body.location.is_some() {
        plot.location = body.location;
    }
    if body.species.is_some() {
        plot.species = body.species;
    }
    if body.area.is_some() {
        plot.area = body.area;
    }
    plot.updated_at = Some("2024-05-02T00:00:00Z".to_string());
    reply(plot)
}

async fn delete_plot(State(world): State<Shared>, Path(id): Path<String>) -> Response {
    let mut world = world.lock();
    let before = world.plots.len();
    world.plots.retain(|p| p.plot_id != id);
    if world.plots.len() == before {
        return detail(StatusCode::NOT_FOUND, "Plot not found");
    }
    reply(json!({ "message": "Plot deleted successfully" }))
}

fn reading(plot_id: &str, n: u64) -> PlotState {
    PlotState {
        plot_id: plot_id.to_string(),
        timestamp: format!("2024-05-01T12:{:02}:00Z", n % 60),
        temperature: Some(20.0 + (n % 10) as f64),
        humidity: Some(55.0),
        soil_moisture: Some(31.5),
        light: None,
    }
}

async fn plot_state(State(world): State<Shared>, Path(id): Path<String>) -> Response {
    let mut world = world.lock();
    if !world.plots.iter().any(|p| p.plot_id == id) {
        return detail(StatusCode::NOT_FOUND, "Plot not found");
    }
    let n = world.next();
    reply(reading(&id, n))
}

async fn plot_history(
    State(world): State<Shared>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut world = world.lock();
    world.history_query = params;
    let history: Vec<PlotState> = (1..=3).map(|n| reading(&id, n)).collect();
    reply(history)
}

async fn recommended_irrigation(Path(_id): Path<String>) -> Response {
    detail(StatusCode::NOT_FOUND, "No recommended irrigation found")
}

async fn list_species(State(world): State<Shared>) -> Response {
    let world = world.lock();
    if world.species.is_empty() {
        return detail(StatusCode::NOT_FOUND, "No species found");
    }
    reply(json!({ "count": world.species.len(), "species": world.species }))
}

async fn create_species(State(world): State<Shared>, Json(body): Json<CreateSpecies>) -> Response {
    let mut world = world.lock();
    let species = Species {
        pk: format!("SPECIES#sp-{}", world.next()),
        sk: "METADATA".to_string(),
        name: body.name,
        kind: "SPECIES".to_string(),
    };
    world.species.push(species.clone());
    reply(json!({ "message": "Species created successfully", "created_species": species }))
}

async fn delete_species(State(world): State<Shared>, Path(id): Path<String>) -> Response {
    let mut world = world.lock();
    let before = world.species.len();
    world.species.retain(|s| s.species_id() != id);
    if world.species.len() == before {
        return detail(StatusCode::NOT_FOUND, "Species not found");
    }
    reply(json!({ "message": "Species deleted successfully" }))
}

async fn assign_species(
    State(world): State<Shared>,
    Path((species_id, plot_id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut world = world.lock();
    let Some(name) = world
        .species
        .iter()
        .find(|s| s.species_id() == species_id)
        .map(|s| s.name.clone())
    else {
        return detail(StatusCode::NOT_FOUND, "Species not found");
    };
    let facility_id = params.get("facility_id").cloned().unwrap_or_default();
    let Some(plot) = world
        .plots
        .iter_mut()
        .find(|p| p.plot_id == plot_id && p.facility_id == facility_id)
    else {
        return detail(StatusCode::NOT_FOUND, "Plot not found in facility");
    };
    plot.species = Some(name);
    reply(json!({ "message": "Species assigned to plot successfully" }))
}

async fn list_irrigations(State(world): State<Shared>, Path(plot_id): Path<String>) -> Response {
    let world = world.lock();
    reply(world.irrigations.get(&plot_id).cloned().unwrap_or_default())
}

async fn last_irrigation(State(world): State<Shared>, Path(plot_id): Path<String>) -> Response {
    let world = world.lock();
    match world.irrigations.get(&plot_id).and_then(|events| events.last()) {
        Some(event) => reply(event),
        None => detail(StatusCode::NOT_FOUND, "No irrigation found"),
    }
}

async fn record_irrigation(
    State(world): State<Shared>,
    Path(plot_id): Path<String>,
    Json(body): Json<CreateIrrigation>,
) -> Response {
    let mut world = world.lock();
    let n = world.next();
    let event = IrrigationEvent {
        plot_id: plot_id.clone(),
        timestamp: body
            .timestamp
            .unwrap_or_else(|| format!("2024-05-01T06:{:02}:00Z", n % 60)),
        event_type: body.event_type,
        duration: body.duration,
        water_amount: body.water_amount,
        irrigation_type: body.irrigation_type.or_else(|| Some("manual".to_string())),
    };
    world.irrigations.entry(plot_id).or_default().push(event.clone());
    reply(event)
}

async fn get_user(State(world): State<Shared>, Path(id): Path<String>) -> Response {
    let world = world.lock();
    match world.users.get(&id) {
        Some(user) => reply(user),
        None => detail(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn update_user(State(world): State<Shared>, Path(id): Path<String>, Json(body): Json<UpdateUser>) -> Response {
    let mut world = world.lock();
    let Some(user) = world.users.get_mut(&id) else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    if body.name.is_some() {
        user.name = body.name;
    }
    if body.email.is_some() {
        user.email = body.email;
    }
    reply(user.clone())
}

fn router(world: Shared) -> Router {
    let backend = Router::new()
        .route("/facilities/", get(list_facilities).post(create_facility))
        .route(
            "/facilities/{id}",
            get(get_facility).put(update_facility).delete(delete_facility),
        )
        .route("/plots/facility/{id}", get(facility_plots))
        .route("/users/{id}", get(get_user).put(update_user))
        .route("/users/{id}/plots", get(user_plots))
        .route("/plot", post(create_plot))
        .route("/plot/{id}", get(get_plot).put(update_plot).delete(delete_plot))
        .route("/plot/{id}/state", get(plot_state))
        .route("/plot/{id}/history", get(plot_history))
        .route("/plot/{id}/recommended-irrigation", get(recommended_irrigation))
        .route("/species/", get(list_species).post(create_species))
        .route("/species/{id}", axum::routing::delete(delete_species))
        .route("/species/{id}/assign-to-plot/{plot}", put(assign_species))
        .route("/irrigations/plot/{id}/irrigations", get(list_irrigations))
        .route("/irrigations/plot/{id}/last-irrigation", get(last_irrigation))
        .route("/irrigations/plot/{id}/irrigation", post(record_irrigation))
        .route_layer(middleware::from_fn_with_state(world.clone(), gate));

    Router::new()
        .route("/cognito", post(identity))
        .merge(backend)
        .with_state(world)
}

// ============================================
// Test environment
// ============================================

/// Test environment that owns the fake servers and a credential directory.
pub struct TestEnv {
    /// Fake server state.
    pub world: Shared,
    /// Client configuration pointing at the fake servers.
    pub config: Config,
    dir: TempDir,
    server: JoinHandle<()>,
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl TestEnv {
    /// Starts the fake servers.
    pub async fn new() -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("merida_auth=debug,merida_api=debug")
            .with_test_writer()
            .try_init();

        let world: Shared = Arc::default();
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        let app = router(world.clone());
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("fake server stopped: {e}");
            }
        });

        let mut config = Config::for_testing(&format!("{base_url}/cognito"), &base_url);
        config.query.poll_interval = Duration::from_millis(50);

        Ok(Self {
            world,
            config,
            dir: tempfile::tempdir()?,
            server,
        })
    }

    /// Registers a confirmed account and its backend profile. Returns its `sub`.
    pub fn add_user(&self, username: &str, password: &str) -> String {
        let mut world = self.world.lock();
        let sub = format!("sub-{}", world.next());
        let mut attributes = BTreeMap::new();
        if username.contains('@') {
            attributes.insert("email".to_string(), username.to_string());
        }
        world.accounts.insert(
            username.to_string(),
            Account {
                password: password.to_string(),
                sub: sub.clone(),
                attributes,
                required: None,
            },
        );
        world.users.insert(
            sub.clone(),
            User {
                user_id: sub.clone(),
                email: Some(username.to_string()),
                name: None,
                created_at: Some("2024-01-01T00:00:00Z".to_string()),
                facilities: None,
            },
        );
        sub
    }

    /// Registers an account created by an administrator: it must set a new
    /// password and supply `required` attributes on first sign-in.
    pub fn add_challenged_user(&self, username: &str, password: &str, required: &[&str]) -> String {
        let sub = self.add_user(username, password);
        let mut world = self.world.lock();
        if let Some(account) = world.accounts.get_mut(username) {
            account.attributes.clear();
            account.attributes.insert("email_verified".to_string(), "true".to_string());
            account.required = Some(required.iter().map(|a| (*a).to_string()).collect());
        }
        sub
    }

    /// Attributes stored on an account.
    pub fn account_attributes(&self, username: &str) -> BTreeMap<String, String> {
        self.world
            .lock()
            .accounts
            .get(username)
            .map(|a| a.attributes.clone())
            .unwrap_or_default()
    }

    /// Number of access tokens the fake pool still honors.
    pub fn live_tokens(&self) -> usize {
        self.world.lock().tokens.len()
    }

    /// Identity operations received so far.
    pub fn idp_calls(&self) -> Vec<String> {
        self.world.lock().idp_calls.clone()
    }

    /// Path of the persistent credential file.
    pub fn credentials_path(&self) -> PathBuf {
        self.dir.path().join("credentials.json")
    }

    /// Builds a session manager backed by the credential file.
    pub fn session_manager(&self) -> anyhow::Result<Manager> {
        let provider = CognitoProvider::new(&self.config.auth)?;
        let gateway = IdentityGateway::new(
            provider,
            &self.config.auth.client_id,
            Arc::new(FileStore::open(self.credentials_path())?),
            Arc::new(MemoryStore::new()),
        );
        Ok(Arc::new(SessionManager::new(gateway)))
    }

    /// Builds the query layer, authorized by `manager`.
    pub fn queries(&self, manager: &Manager) -> anyhow::Result<Arc<Queries>> {
        let client = ApiClient::new(&self.config.api)?.with_token_source(manager.clone());
        let cache = QueryCache::new(&self.config.query).with_retry_delay(Duration::from_millis(10));
        Ok(Arc::new(Queries::new(client, &self.config.query).with_cache(cache)))
    }

    /// Registers the default grower, signs in and builds the query layer.
    pub async fn signed_in(&self) -> anyhow::Result<(Manager, Arc<Queries>, String)> {
        let sub = self.add_user(GROWER, PASSWORD);
        let manager = self.session_manager()?;
        let challenge = manager.login(GROWER, PASSWORD, None, None).await?;
        anyhow::ensure!(!challenge.requires_new_password, "unexpected challenge");
        let queries = self.queries(&manager)?;
        Ok((manager, queries, sub))
    }

    /// Number of requests a backend route received, e.g. `GET /facilities/`.
    pub fn hits(&self, route: &str) -> usize {
        self.world.lock().hits.get(route).copied().unwrap_or(0)
    }

    /// Makes the next request to `route` fail with `status`.
    pub fn fail_next(&self, route: &str, status: u16) {
        self.world
            .lock()
            .failures
            .entry(route.to_string())
            .or_default()
            .push_back(status);
    }

    /// Adds a facility directly to the backend.
    pub fn seed_facility(&self, name: &str) -> String {
        let mut world = self.world.lock();
        let facility_id = format!("fac-{}", world.next());
        world.facilities.push(Facility {
            facility_id: facility_id.clone(),
            name: name.to_string(),
            location: Some("Mérida".to_string()),
            created_at: None,
        });
        facility_id
    }

    /// Adds a plot directly to the backend.
    pub fn seed_plot(&self, facility_id: &str, name: &str) -> String {
        let mut world = self.world.lock();
        let plot_id = format!("plot-{}", world.next());
        world.plots.push(PlotMetadata {
            plot_id: plot_id.clone(),
            facility_id: facility_id.to_string(),
            name: Some(name.to_string()),
            location: None,
            species: None,
            area: Some(12.5),
            mac_address: None,
            created_at: None,
            updated_at: None,
        });
        plot_id
    }

    /// Adds a species directly to the backend. Returns its id.
    pub fn seed_species(&self, name: &str) -> String {
        let mut world = self.world.lock();
        let species_id = format!("sp-{}", world.next());
        world.species.push(Species {
            pk: format!("SPECIES#{species_id}"),
            sk: "METADATA".to_string(),
            name: name.to_string(),
            kind: "SPECIES".to_string(),
        });
        species_id
    }
}
