//! Per-feature request state with a stale-result guard.
//!
//! Each feature slice remembers the id of its latest request. Results that
//! arrive for an older id are dropped, so a slow response can never overwrite
//! a newer one.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    error::{AppError, AppResult, ErrorView},
    models::{AffiliateResult, GeneratedVideo, MovementAnalysis, StructuredScenePrompt},
};

pub type RequestId = u64;

/// Shared id source for every slice of a session.
#[derive(Debug, Default)]
pub struct RequestCounter(AtomicU64);

impl RequestCounter {
    pub fn next(&self) -> RequestId {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(ErrorView),
}

#[derive(Debug)]
pub struct FeatureState<T> {
    latest: Option<RequestId>,
    phase: Phase<T>,
}

impl<T> Default for FeatureState<T> {
    fn default() -> Self {
        Self {
            latest: None,
            phase: Phase::Idle,
        }
    }
}

impl<T> FeatureState<T> {
    /// Starts a request, clearing any previous result or error.
    pub fn begin(&mut self, counter: &RequestCounter) -> RequestId {
        let id = counter.next();
        self.latest = Some(id);
        self.phase = Phase::Loading;
        id
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        self.latest == Some(id)
    }

    /// Stores `result` if `id` is still the latest request. Returns whether it
    /// was applied.
    pub fn resolve(&mut self, id: RequestId, result: AppResult<T>) -> bool {
        if !self.is_current(id) {
            tracing::debug!(id, latest = ?self.latest, "dropping stale result");
            return false;
        }

        self.phase = match result {
            Ok(value) => Phase::Ready(value),
            Err(error) => Phase::Failed(ErrorView::from(&error)),
        };
        true
    }

    pub fn phase(&self) -> &Phase<T> {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match &self.phase {
            Phase::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorView> {
        match &self.phase {
            Phase::Failed(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub needs_reauthorization: bool,
}

impl Credentials {
    pub fn reauthorized(&mut self) {
        self.needs_reauthorization = false;
    }
}

pub type Slice<T> = fn(&mut StudioSession) -> &mut FeatureState<T>;

/// All feature slices of one studio session.
#[derive(Debug, Default)]
pub struct StudioSession {
    counter: RequestCounter,
    pub credentials: Credentials,
    pub images: FeatureState<Vec<String>>,
    pub video: FeatureState<GeneratedVideo>,
    pub structured: FeatureState<StructuredScenePrompt>,
    pub scene_images: FeatureState<Vec<String>>,
    pub affiliate: FeatureState<AffiliateResult>,
    pub analysis: FeatureState<MovementAnalysis>,
    pub feedback: FeatureState<String>,
    pub suggestions: FeatureState<Vec<String>>,
    pub dialogue: FeatureState<String>,
}

impl StudioSession {
    pub fn begin<T>(&mut self, slice: Slice<T>) -> RequestId {
        let id = self.counter.next();
        let state = slice(self);
        state.latest = Some(id);
        state.phase = Phase::Loading;
        id
    }

    /// Resolves a slice and flags the credentials when a current request
    /// failed authorization.
    pub fn resolve<T>(&mut self, slice: Slice<T>, id: RequestId, result: AppResult<T>) -> bool {
        let current = slice(self).is_current(id);
        if current && result.as_ref().is_err_and(AppError::requires_reauthorization) {
            tracing::warn!("authorization failed, credentials must be selected again");
            self.credentials.needs_reauthorization = true;
        }
        slice(self).resolve(id, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn late_result_of_an_older_request_is_ignored() {
        let counter = RequestCounter::default();
        let mut state = FeatureState::<String>::default();

        let first = state.begin(&counter);
        let second = state.begin(&counter);
        assert!(state.resolve(second, Ok("new".into())));
        assert!(!state.resolve(first, Ok("old".into())));

        assert_eq!(state.value().map(String::as_str), Some("new"));
    }

    #[test]
    fn begin_clears_previous_outcome() {
        let counter = RequestCounter::default();
        let mut state = FeatureState::<u8>::default();
        assert_eq!(state.phase(), &Phase::Idle);

        let id = state.begin(&counter);
        state.resolve(id, Err(AppError::SafetyBlocked));
        assert_eq!(state.error().map(|e| e.kind), Some(ErrorKind::SafetyBlocked));

        state.begin(&counter);
        assert!(state.is_loading());
        assert!(state.error().is_none());
    }

    #[test]
    fn ids_are_shared_across_slices() {
        let mut session = StudioSession::default();
        let image = session.begin(|s| &mut s.images);
        let video = session.begin(|s| &mut s.video);
        assert_ne!(image, video);
        assert!(!session.video.is_current(image));
    }

    #[test]
    fn authorization_failure_flags_credentials() {
        let mut session = StudioSession::default();

        let id = session.begin(|s| &mut s.images);
        session.resolve(|s| &mut s.images, id, Err(AppError::SafetyBlocked));
        assert!(!session.credentials.needs_reauthorization);

        let id = session.begin(|s| &mut s.images);
        session.resolve(
            |s| &mut s.images,
            id,
            Err(AppError::Authorization("NOT_FOUND".into())),
        );
        assert!(session.credentials.needs_reauthorization);
        assert_eq!(
            session.images.error().map(|e| e.kind),
            Some(ErrorKind::AuthorizationFailed)
        );

        session.credentials.reauthorized();
        assert!(!session.credentials.needs_reauthorization);
    }

    #[test]
    fn stale_authorization_failure_is_ignored_entirely() {
        let mut session = StudioSession::default();
        let stale = session.begin(|s| &mut s.analysis);
        let fresh = session.begin(|s| &mut s.analysis);

        assert!(!session.resolve(
            |s| &mut s.analysis,
            stale,
            Err(AppError::Authorization("expired".into()))
        ));
        assert!(!session.credentials.needs_reauthorization);
        assert!(session.analysis.is_current(fresh));
        assert!(session.analysis.is_loading());
    }
}
