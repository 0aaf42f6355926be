use serde::{Deserialize, Serialize};

use crate::{color::CustomColorInput, data::ImageRef};

/// Identifies one recolor attempt. Only the latest token may change the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    InFlight(RequestToken),
}

impl RequestState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestState::InFlight(_))
    }
}

/// What to do when a recolor is invoked while another is still in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrencyPolicy {
    /// Refuse the new request
    #[default]
    Reject,
    /// Issue the new request; the older one's response is dropped
    Supersede,
}

/// Why a recolor could not start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginError {
    NoImage,
    Busy,
}

/// Effect of resolving a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Token was current; the screen took the result (if any)
    Current,
    /// Token was superseded or invalidated; nothing changed
    Stale,
}

/// In-memory state of the recolor screen.
///
/// Every transition is synchronous; the async controller drives it between
/// suspension points.
#[derive(Debug, Clone, Default)]
pub struct ScreenState {
    displayed: Option<ImageRef>,
    original: Option<ImageRef>,
    custom: CustomColorInput,
    /// Token whose response may still change the displayed image
    request: Option<RequestToken>,
    /// Calls begun and not yet resolved, stale ones included
    outstanding: usize,
    generation: u64,
}

impl ScreenState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn displayed(&self) -> Option<&ImageRef> {
        self.displayed.as_ref()
    }

    pub fn original(&self) -> Option<&ImageRef> {
        self.original.as_ref()
    }

    pub fn custom(&self) -> &CustomColorInput {
        &self.custom
    }

    pub fn custom_mut(&mut self) -> &mut CustomColorInput {
        &mut self.custom
    }

    /// In flight while any call is unresolved, reporting the latest token issued
    pub fn request_state(&self) -> RequestState {
        if self.outstanding == 0 {
            RequestState::Idle
        } else {
            RequestState::InFlight(RequestToken(self.generation))
        }
    }

    /// A newly acquired image replaces both the displayed and the original image
    pub fn acquire(&mut self, image: ImageRef) {
        self.displayed = Some(image.clone());
        self.original = Some(image);
        self.invalidate();
    }

    /// Show the original image again
    pub fn revert(&mut self) {
        self.displayed = self.original.clone();
        self.invalidate();
    }

    /// Issue a token for a new recolor of the displayed image
    pub fn begin_recolor(
        &mut self,
        policy: ConcurrencyPolicy,
    ) -> Result<(RequestToken, ImageRef), BeginError> {
        let image = self.displayed.clone().ok_or(BeginError::NoImage)?;
        if self.outstanding > 0 && policy == ConcurrencyPolicy::Reject {
            return Err(BeginError::Busy);
        }
        self.generation += 1;
        let token = RequestToken(self.generation);
        self.request = Some(token);
        self.outstanding += 1;
        Ok((token, image))
    }

    /// Resolve a token once its call has returned. `Some(image)` replaces the
    /// displayed image when the token is current; `None` changes nothing else.
    pub fn finish_recolor(&mut self, token: RequestToken, image: Option<ImageRef>) -> Resolution {
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.request != Some(token) {
            return Resolution::Stale;
        }
        if let Some(image) = image {
            self.displayed = Some(image);
        }
        self.request = None;
        Resolution::Current
    }

    /// Drop the right of the current call to apply. The call itself stays
    /// outstanding until it is resolved.
    fn invalidate(&mut self) {
        self.request = None;
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use crate::data::DataUrl;

    use super::*;

    fn file(name: &str) -> ImageRef {
        ImageRef::File(PathBuf::from(name))
    }

    fn inline(bytes: &[u8]) -> ImageRef {
        ImageRef::DataUrl(DataUrl::from_bytes("image/png", bytes))
    }

    #[test]
    fn test_acquire_sets_both_images() {
        let mut state = ScreenState::new();
        assert_eq!(state.displayed(), None);
        assert_eq!(state.request_state(), RequestState::Idle);

        state.acquire(file("a.jpg"));
        assert_eq!(state.displayed(), Some(&file("a.jpg")));
        assert_eq!(state.original(), state.displayed());

        state.acquire(file("b.jpg"));
        assert_eq!(state.original(), Some(&file("b.jpg")));
        assert_eq!(state.original(), state.displayed());
    }

    #[test]
    fn test_revert_is_idempotent() {
        let mut state = ScreenState::new();
        state.revert();
        assert_eq!(state.displayed(), None);

        state.acquire(file("a.jpg"));
        let (token, _) = state.begin_recolor(ConcurrencyPolicy::Reject).unwrap();
        state.finish_recolor(token, Some(inline(b"b")));
        assert_eq!(state.displayed(), Some(&inline(b"b")));

        state.revert();
        let once = state.displayed().cloned();
        state.revert();
        assert_eq!(state.displayed().cloned(), once);
        assert_eq!(once, Some(file("a.jpg")));
    }

    #[test]
    fn test_begin_without_image() {
        let mut state = ScreenState::new();
        assert_eq!(
            state.begin_recolor(ConcurrencyPolicy::Supersede),
            Err(BeginError::NoImage)
        );
        assert_eq!(state.request_state(), RequestState::Idle);
    }

    #[test]
    fn test_reject_policy_refuses_second_request() {
        let mut state = ScreenState::new();
        state.acquire(file("a.jpg"));

        let (token, image) = state.begin_recolor(ConcurrencyPolicy::Reject).unwrap();
        assert_eq!(image, file("a.jpg"));
        assert_eq!(state.request_state(), RequestState::InFlight(token));
        assert_eq!(
            state.begin_recolor(ConcurrencyPolicy::Reject),
            Err(BeginError::Busy)
        );

        assert_eq!(state.finish_recolor(token, None), Resolution::Current);
        assert_eq!(state.request_state(), RequestState::Idle);
        assert_eq!(state.displayed(), Some(&file("a.jpg")));
    }

    #[test]
    fn test_only_latest_token_applies() {
        let mut state = ScreenState::new();
        state.acquire(file("a.jpg"));

        let (first, _) = state.begin_recolor(ConcurrencyPolicy::Supersede).unwrap();
        let (second, _) = state.begin_recolor(ConcurrencyPolicy::Supersede).unwrap();
        assert!(second > first);

        assert_eq!(
            state.finish_recolor(second, Some(inline(b"blue"))),
            Resolution::Current
        );
        assert_eq!(
            state.finish_recolor(first, Some(inline(b"red"))),
            Resolution::Stale
        );
        assert_eq!(state.displayed(), Some(&inline(b"blue")));
        assert_eq!(state.original(), Some(&file("a.jpg")));
        assert_eq!(state.request_state(), RequestState::Idle);
    }

    #[test]
    fn test_acquire_and_revert_invalidate_flight() {
        let mut state = ScreenState::new();
        state.acquire(file("a.jpg"));
        let (token, _) = state.begin_recolor(ConcurrencyPolicy::Reject).unwrap();

        state.acquire(file("b.jpg"));
        assert_eq!(state.request_state(), RequestState::InFlight(token));
        assert_eq!(
            state.finish_recolor(token, Some(inline(b"late"))),
            Resolution::Stale
        );
        assert_eq!(state.request_state(), RequestState::Idle);
        assert_eq!(state.displayed(), Some(&file("b.jpg")));

        let (token, _) = state.begin_recolor(ConcurrencyPolicy::Reject).unwrap();
        state.revert();
        assert_eq!(
            state.finish_recolor(token, Some(inline(b"late"))),
            Resolution::Stale
        );
        assert_eq!(state.displayed(), Some(&file("b.jpg")));
    }

    #[test]
    fn test_reject_waits_for_invalidated_call() {
        let mut state = ScreenState::new();
        state.acquire(file("a.jpg"));
        let (first, _) = state.begin_recolor(ConcurrencyPolicy::Reject).unwrap();

        state.revert();
        assert!(state.request_state().is_in_flight());
        assert_eq!(
            state.begin_recolor(ConcurrencyPolicy::Reject),
            Err(BeginError::Busy)
        );

        assert_eq!(state.finish_recolor(first, None), Resolution::Stale);
        assert_eq!(state.request_state(), RequestState::Idle);
        let (second, _) = state.begin_recolor(ConcurrencyPolicy::Reject).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_supersede_stays_in_flight_until_every_call_returns() {
        let mut state = ScreenState::new();
        state.acquire(file("a.jpg"));

        let (first, _) = state.begin_recolor(ConcurrencyPolicy::Supersede).unwrap();
        let (second, _) = state.begin_recolor(ConcurrencyPolicy::Supersede).unwrap();
        assert_eq!(state.request_state(), RequestState::InFlight(second));

        assert_eq!(
            state.finish_recolor(second, Some(inline(b"blue"))),
            Resolution::Current
        );
        assert_eq!(state.request_state(), RequestState::InFlight(second));

        assert_eq!(state.finish_recolor(first, None), Resolution::Stale);
        assert_eq!(state.request_state(), RequestState::Idle);
        assert_eq!(state.displayed(), Some(&inline(b"blue")));
    }
}
