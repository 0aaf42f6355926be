//! The photo recolor screen.
//!
//! [`Screen`] owns the transient screen state and wires user actions (take or
//! select a photo, pick a preset, type a custom color, revert) to the device,
//! the recolor endpoint and the view. It is meant to be driven from a single
//! task: state lives in a `RefCell` and no borrow is held across an `.await`,
//! so handlers only interleave at their suspension points.

pub mod state;

use std::{cell::RefCell, fmt};

use anyhow::Result;

use crate::{
    color::{Channel, Preset, TargetColor},
    data::ImageRef,
    endpoint::{RecolorEndpoint, RecolorRequest, RecolorResponse},
    error::ColorInputError,
    media::{Access, CaptureOptions, MediaDevice},
};

use state::{BeginError, ConcurrencyPolicy, RequestState, Resolution, ScreenState};

/// User-facing message shown by the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PermissionDenied,
    AcquisitionFailed,
    NoImageSelected,
    InvalidColor(ColorInputError),
    Busy,
    UploadFailed,
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::PermissionDenied => "Sorry, we need camera roll permissions to make this work!",
            Notice::AcquisitionFailed => "Could not load the photo",
            Notice::NoImageSelected => "Please select an image first.",
            Notice::InvalidColor(_) => "Invalid color",
            Notice::Busy => "A recolor is already in progress.",
            Notice::UploadFailed => "Upload failed",
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            Notice::AcquisitionFailed | Notice::UploadFailed => {
                Some("Please try again.".to_string())
            }
            Notice::InvalidColor(err) => Some(err.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}: {}", self.title(), message),
            None => f.write_str(self.title()),
        }
    }
}

/// Presentation side of the screen
pub trait ScreenView {
    /// Blocking notice, shown once per failure
    fn notify(&self, notice: &Notice);

    /// Loading indicator, shown in place of the image while a recolor is in flight
    fn set_loading(&self, _loading: bool) {}

    fn show_image(&self, _image: Option<&ImageRef>) {}
}

/// Outcome of taking or selecting a photo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    Acquired,
    Cancelled,
    Denied,
    Failed,
}

/// Outcome of a recolor action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecolorOutcome {
    /// The response replaced the displayed image
    Applied,
    /// No image to send; nothing was attempted
    NoImage,
    /// Custom channel text was rejected; nothing was attempted
    InvalidColor,
    /// Another recolor is in flight; nothing was attempted
    Busy,
    /// Reading, transport or a non-2xx status failed
    Failed,
    /// 2xx, but the body is not an image. Logged only.
    Malformed,
    /// Superseded or invalidated while in flight; the response was dropped
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenOptions {
    pub capture: CaptureOptions,
    pub policy: ConcurrencyPolicy,
}

#[derive(Debug, Clone, Copy)]
enum Origin {
    Camera,
    Library,
}

pub struct Screen<D, E, V> {
    device: D,
    endpoint: E,
    view: V,
    options: ScreenOptions,
    state: RefCell<ScreenState>,
}

impl<D, E, V> Screen<D, E, V>
where
    D: MediaDevice,
    E: RecolorEndpoint,
    V: ScreenView,
{
    pub fn new(device: D, endpoint: E, view: V, options: ScreenOptions) -> Self {
        Self {
            device,
            endpoint,
            view,
            options,
            state: RefCell::new(ScreenState::new()),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn displayed(&self) -> Option<ImageRef> {
        self.state.borrow().displayed().cloned()
    }

    pub fn original(&self) -> Option<ImageRef> {
        self.state.borrow().original().cloned()
    }

    pub fn request_state(&self) -> RequestState {
        self.state.borrow().request_state()
    }

    pub fn custom_channel(&self, channel: Channel) -> String {
        self.state.borrow().custom().get(channel).to_string()
    }

    /// "Take a Photo"
    pub async fn take_photo(&self) -> Acquisition {
        self.acquire(Origin::Camera).await
    }

    /// "Select a Photo"
    pub async fn select_photo(&self) -> Acquisition {
        self.acquire(Origin::Library).await
    }

    /// "Original Look"
    pub fn revert(&self) {
        self.update(|state| state.revert());
    }

    /// Text change in one of the custom color fields
    pub fn set_custom_channel(&self, channel: Channel, text: &str) {
        self.state.borrow_mut().custom_mut().set(channel, text);
    }

    /// "Red Tiles", "Green Tiles", "Blue Tiles"
    pub async fn recolor_preset(&self, preset: Preset) -> RecolorOutcome {
        self.recolor(preset.color()).await
    }

    /// "Custom Color": the text fields are parsed now, not when typed
    pub async fn recolor_custom(&self) -> RecolorOutcome {
        let parsed = {
            let state = self.state.borrow();
            state.displayed().map(|_| state.custom().parse())
        };
        match parsed {
            None => {
                self.view.notify(&Notice::NoImageSelected);
                RecolorOutcome::NoImage
            }
            Some(Err(err)) => {
                log::warn!("rejected custom color: {}", err);
                self.view.notify(&Notice::InvalidColor(err));
                RecolorOutcome::InvalidColor
            }
            Some(Ok(color)) => self.recolor(color).await,
        }
    }

    /// Send the displayed image to the endpoint and show what comes back
    pub async fn recolor(&self, color: TargetColor) -> RecolorOutcome {
        let policy = self.options.policy;
        let (token, image) = match self.update(|state| state.begin_recolor(policy)) {
            Ok(begun) => begun,
            Err(BeginError::NoImage) => {
                self.view.notify(&Notice::NoImageSelected);
                return RecolorOutcome::NoImage;
            }
            Err(BeginError::Busy) => {
                self.view.notify(&Notice::Busy);
                return RecolorOutcome::Busy;
            }
        };
        log::info!("recolor #{} with {}", token.generation(), color);

        let response = match self.submit(&image, color).await {
            Ok(response) => response,
            Err(err) => {
                log::error!("upload failed: {:#}", err);
                return match self.update(|state| state.finish_recolor(token, None)) {
                    Resolution::Current => {
                        self.view.notify(&Notice::UploadFailed);
                        RecolorOutcome::Failed
                    }
                    Resolution::Stale => RecolorOutcome::Stale,
                };
            }
        };

        let (recolored, outcome) = match response.to_image() {
            Ok(recolored) => (Some(recolored), RecolorOutcome::Applied),
            Err(err) => {
                log::error!("expected an image from the endpoint: {}", err);
                (None, RecolorOutcome::Malformed)
            }
        };
        match self.update(|state| state.finish_recolor(token, recolored)) {
            Resolution::Current => outcome,
            Resolution::Stale => {
                log::debug!("dropping response for superseded recolor #{}", token.generation());
                RecolorOutcome::Stale
            }
        }
    }

    async fn submit(&self, image: &ImageRef, color: TargetColor) -> Result<RecolorResponse> {
        let payload = self.device.read_as_base64(image).await?;
        let request = RecolorRequest::new(payload, color);
        Ok(self.endpoint.recolor(&request).await?)
    }

    async fn acquire(&self, origin: Origin) -> Acquisition {
        if self.device.request_access().await == Access::Denied {
            self.view.notify(&Notice::PermissionDenied);
            return Acquisition::Denied;
        }

        let options = &self.options.capture;
        let picked = match origin {
            Origin::Camera => self.device.capture(options).await,
            Origin::Library => self.device.pick(options).await,
        };
        match picked {
            Ok(Some(image)) => {
                log::info!("acquired {:?} from {:?}", image, origin);
                self.update(|state| state.acquire(image));
                Acquisition::Acquired
            }
            Ok(None) => Acquisition::Cancelled,
            Err(err) => {
                log::error!("failed to acquire image: {:#}", err);
                self.view.notify(&Notice::AcquisitionFailed);
                Acquisition::Failed
            }
        }
    }

    /// Apply a transition and tell the view what changed
    fn update<R>(&self, f: impl FnOnce(&mut ScreenState) -> R) -> R {
        let (result, loading, displayed) = {
            let mut state = self.state.borrow_mut();
            let was_loading = state.request_state().is_in_flight();
            let was_displayed = state.displayed().cloned();

            let result = f(&mut *state);

            let loading = state.request_state().is_in_flight();
            let displayed = state.displayed().cloned();
            (
                result,
                (loading != was_loading).then_some(loading),
                (displayed != was_displayed).then_some(displayed),
            )
        };
        if let Some(loading) = loading {
            self.view.set_loading(loading);
        }
        if let Some(displayed) = displayed {
            self.view.show_image(displayed.as_ref());
        }
        result
    }
}
