//! Session-bound route-planning orchestrator.
//!
//! One inbound chat turn runs one pass: the session is locked, its stage picks
//! the branch, collaborators are called one at a time, and the session always
//! ends the pass in START or WAITING_CITY.

pub mod address;
pub mod error;
pub mod locate;
pub mod mocks;
pub mod model;
pub mod numeric;
pub mod planner;
pub mod ports;
pub mod render;
pub mod selector;
pub mod session;

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use anyhow::Result;
use protocol::{RouteRequest, RouteResponse, SessionSnapshot};
use tokio::sync::MutexGuard;
use tracing::{error, info, info_span, warn, Instrument};

use address::AddressFormatter;
use error::{Endpoint, PipelineError};
use model::{CityAnalysis, Coordinate, FormattedAddresses, IntentResult, LocationPair, TravelMode};
use ports::{InterpreterPort, MapPort};
use session::{SessionEventType, SessionState, SessionStore, Stage};

const RESOLVED_FORMAT_FAILURE: &str = "❌ 地址格式化失败，请提供更详细的地址信息";
const UNRECOGNIZED_LOCATIONS: &str = "❌ 未能正确识别起点和终点";

/// Knobs that are fixed per deployment rather than per request.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Operating region sent with every transit query.
    pub transit_city: String,
    /// Upper bound on any single collaborator call.
    pub call_timeout: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            transit_city: "深圳".to_string(),
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Headless orchestrator: consumes chat turns, returns replies.
pub struct OrchestratorCore<I: InterpreterPort, M: MapPort> {
    interpreter: I,
    maps: M,
    sessions: SessionStore,
    formatter: AddressFormatter,
    config: CoreConfig,
}

impl<I: InterpreterPort, M: MapPort> OrchestratorCore<I, M> {
    pub fn new(interpreter: I, maps: M) -> Self {
        Self::with_config(interpreter, maps, CoreConfig::default())
    }

    pub fn with_config(interpreter: I, maps: M, config: CoreConfig) -> Self {
        Self {
            interpreter,
            maps,
            sessions: SessionStore::new(),
            formatter: AddressFormatter::default(),
            config,
        }
    }

    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    pub fn maps(&self) -> &M {
        &self.maps
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Forget a session. Idempotent; reports whether it existed.
    pub async fn clear_session(&self, session_id: &str) -> bool {
        let existed = self.sessions.clear(session_id).await;
        info!(session_id = %session_id, existed, "session cleared");
        existed
    }

    pub async fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        let handle = self.sessions.get(session_id).await?;
        let state = handle.lock().await;
        Some(SessionSnapshot {
            session_id: session_id.to_string(),
            stage: state.stage.to_string(),
            locations: state.locations.as_ref().map(LocationPair::to_vec).unwrap_or_default(),
            turns: state.history.turn_count(),
            created_at: state.created_at,
            last_active: state.last_active,
        })
    }

    /// Entry point for one chat turn.
    ///
    /// Pipeline failures come back as `success=false` replies. `Err` is kept for
    /// failures of the orchestrator itself, and the session is reset first.
    pub async fn handle(&self, request: RouteRequest) -> Result<RouteResponse> {
        let session_id = request.session_key().to_string();
        let handle = self.sessions.get_or_create(&session_id).await;
        let mut session = Pass(handle.lock().await);
        session.touch();
        session.history.add_event(SessionEventType::UserInput(request.user_input.clone()));

        let span = info_span!("turn", session_id = %session_id, stage = %session.stage);
        let outcome = self
            .dispatch(&mut session, &session_id, request.user_input.trim())
            .instrument(span)
            .await;

        match outcome {
            Ok(response) => {
                if session.stage == Stage::Processing {
                    session.reset();
                }
                session.history.add_event(SessionEventType::SystemResponse {
                    success: response.success,
                    text: response.message.clone(),
                });
                Ok(response)
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "orchestration failed; session reset");
                session.reset();
                Err(e)
            }
        }
    }

    async fn dispatch(&self, session: &mut SessionState, session_id: &str, text: &str) -> Result<RouteResponse> {
        match session.stage {
            Stage::Start => self.on_start(session, session_id, text).await,
            Stage::WaitingCity => self.on_city_answer(session, session_id, text).await,
            Stage::Processing => {
                warn!(session_id = %session_id, "session found mid-pipeline; resetting");
                session.reset();
                Ok(RouteResponse::failure(PipelineError::SessionStateCorrupted.user_message(), session_id))
            }
        }
    }

    async fn on_start(&self, session: &mut SessionState, session_id: &str, text: &str) -> Result<RouteResponse> {
        info!("classifying intent");
        let intent = match self.bounded("classify_intent", self.interpreter.classify_intent(text)).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, "intent classification failed; treating as other");
                let malformed = PipelineError::InterpretationMalformed(e.to_string());
                return Ok(RouteResponse::failure(malformed.user_message(), session_id));
            }
        };
        info!(intent = ?intent, "intent classified");

        match &intent {
            IntentResult::RouteRequest { locations } => {
                let Some(pair) = LocationPair::from_mentions(locations) else {
                    return Ok(RouteResponse::failure(UNRECOGNIZED_LOCATIONS, session_id));
                };
                session.locations = Some(pair.clone());
                session.intent = Some(intent.clone());
                session.advance(Stage::WaitingCity)?;
                self.resolve_city(session, session_id, &pair, text).await
            }
            IntentResult::Correction { correction_info, .. } => {
                Ok(self.handle_correction(session_id, correction_info).await)
            }
            IntentResult::Other { reason } => Ok(RouteResponse::failure(
                format!("❌ 无法识别路径规划需求: {}", reason),
                session_id,
            )),
        }
    }

    async fn resolve_city(
        &self,
        session: &mut SessionState,
        session_id: &str,
        pair: &LocationPair,
        text: &str,
    ) -> Result<RouteResponse> {
        let analysis = match self.bounded("resolve_city", self.interpreter.resolve_city(pair, text)).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "city analysis failed; asking the user");
                CityAnalysis::fallback(pair)
            }
        };
        session.city_analysis = Some(analysis.clone());

        match analysis {
            CityAnalysis::NeedsInput { question, analysis } => {
                info!("waiting for city confirmation");
                Ok(RouteResponse::ask_city(format!("🤔 {}\n\n❓ {}", analysis, question), session_id))
            }
            CityAnalysis::Resolved { suggested_city_info, .. } => {
                info!(city = %suggested_city_info, "city resolved from input");
                session.advance(Stage::Processing)?;
                Ok(self.plan(session, session_id, pair, &suggested_city_info, RESOLVED_FORMAT_FAILURE).await)
            }
        }
    }

    async fn on_city_answer(&self, session: &mut SessionState, session_id: &str, text: &str) -> Result<RouteResponse> {
        let Some(pair) = session.locations.clone() else {
            warn!(session_id = %session_id, "waiting for a city without stored locations");
            session.reset();
            return Ok(RouteResponse::failure(PipelineError::SessionStateCorrupted.user_message(), session_id));
        };
        session.advance(Stage::Processing)?;
        let on_format_failure = PipelineError::AddressFormattingFailed.user_message();
        Ok(self.plan(session, session_id, &pair, text, &on_format_failure).await)
    }

    /// Format, then run the map pipeline. Always leaves the session in START.
    async fn plan(
        &self,
        session: &mut SessionState,
        session_id: &str,
        pair: &LocationPair,
        city_hint: &str,
        on_format_failure: &str,
    ) -> RouteResponse {
        let formatted = self
            .formatter
            .format_with(pair, city_hint, move |prompt| {
                self.bounded("format_addresses", self.interpreter.format_addresses(pair, city_hint, prompt))
            })
            .await;

        let response = match formatted {
            Err(e) => {
                warn!(error = %e, "address formatting exhausted");
                RouteResponse::failure(on_format_failure, session_id)
            }
            Ok(addresses) => match self.execute(&addresses).await {
                Ok(itinerary) => RouteResponse::ok(itinerary, session_id),
                Err(e) => {
                    warn!(error = %e, "route pipeline failed");
                    RouteResponse::failure(e.user_message(), session_id)
                }
            },
        };
        session.reset();
        response
    }

    /// geocode → distance → mode → route → text
    async fn execute(&self, addresses: &FormattedAddresses) -> Result<String, PipelineError> {
        let origin = self.geocode(&addresses.origin, Endpoint::Origin).await?;
        let destination = self.geocode(&addresses.destination, Endpoint::Destination).await?;
        let meters = self.measure(&origin, &destination).await?;

        let mode = selector::select_mode(meters);
        info!(meters, %mode, "travel mode selected");

        let unavailable = || PipelineError::RouteUnavailable {
            origin: addresses.origin.clone(),
            destination: addresses.destination.clone(),
        };
        let body = match mode {
            TravelMode::Walking => self.bounded("walking_route", self.maps.walking_route(&origin, &destination)).await,
            TravelMode::Transit => {
                let city = &self.config.transit_city;
                self.bounded("transit_route", self.maps.transit_route(&origin, &destination, city)).await
            }
        }
        .map_err(|e| {
            warn!(error = %e, %mode, "route call failed");
            timeout_or(e, unavailable())
        })?;
        let plan = match mode {
            TravelMode::Walking => planner::walking_plan(&body),
            TravelMode::Transit => planner::transit_plan(&body),
        }
        .ok_or_else(unavailable)?;

        Ok(render::render_plan(&plan, addresses, meters))
    }

    async fn geocode(&self, address: &str, endpoint: Endpoint) -> Result<Coordinate, PipelineError> {
        info!(address = %address, %endpoint, "geocoding");
        let not_found = || PipelineError::GeocodeNotFound { endpoint, address: address.to_string() };
        let body = self
            .bounded("geocode", self.maps.geocode(address))
            .await
            .map_err(|e| {
                warn!(address = %address, error = %e, "geocode call failed");
                timeout_or(e, not_found())
            })?;
        let coordinate = locate::coordinate_from_geocode(&body).ok_or_else(not_found)?;
        info!(address = %address, coordinate = %coordinate, "geocoded");
        Ok(coordinate)
    }

    async fn measure(&self, origin: &Coordinate, destination: &Coordinate) -> Result<i64, PipelineError> {
        let body = self
            .bounded("distance", self.maps.distance(origin, destination))
            .await
            .map_err(|e| {
                warn!(error = %e, "distance call failed");
                timeout_or(e, PipelineError::DistanceUnavailable)
            })?;
        locate::meters_from_distance(&body).ok_or(PipelineError::DistanceUnavailable)
    }

    /// Corrections are answered in place; they never touch the route-request state.
    async fn handle_correction(&self, session_id: &str, correction_info: &str) -> RouteResponse {
        info!(correction = %correction_info, "handling correction");
        let address = match self
            .bounded("extract_corrected_address", self.interpreter.extract_corrected_address(correction_info))
            .await
        {
            Ok(address) => address.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "correction extraction failed");
                return RouteResponse::failure(format!("❌ 处理纠错时出现错误: {}", e), session_id);
            }
        };

        match self.geocode(&address, Endpoint::Origin).await {
            Ok(_) => RouteResponse::ok(
                format!("✅ 找到了 {} 的位置信息。如需重新规划路径，请告诉我起点和终点。", address),
                session_id,
            ),
            Err(_) => RouteResponse::failure(
                format!("❌ 抱歉，无法找到 {} 的位置信息，请提供更详细的地址。", address),
                session_id,
            ),
        }
    }

    async fn bounded<T, F>(&self, call: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let after = self.config.call_timeout;
        match tokio::time::timeout(after, fut).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout { call, after }.into()),
        }
    }
}

/// A timed-out call keeps its own error; anything else becomes `otherwise`.
fn timeout_or(e: anyhow::Error, otherwise: PipelineError) -> PipelineError {
    match e.downcast::<PipelineError>() {
        Ok(timeout @ PipelineError::Timeout { .. }) => timeout,
        _ => otherwise,
    }
}

/// The session lock for one pass. A pass dropped mid-pipeline still leaves START behind.
struct Pass<'a>(MutexGuard<'a, SessionState>);

impl Deref for Pass<'_> {
    type Target = SessionState;

    fn deref(&self) -> &SessionState {
        &self.0
    }
}

impl DerefMut for Pass<'_> {
    fn deref_mut(&mut self) -> &mut SessionState {
        &mut self.0
    }
}

impl Drop for Pass<'_> {
    fn drop(&mut self) {
        if self.0.stage == Stage::Processing {
            warn!("pass abandoned mid-pipeline; session reset");
            self.0.reset();
        }
    }
}
