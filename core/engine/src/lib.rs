pub mod bootstrap;
pub mod collection;
pub mod config_manager;
pub mod dispatch;
pub mod error;
pub mod event_bus;
pub mod health_check;
pub mod latest_frame;
pub mod logging;
pub mod prediction_board;
pub mod protocol;
pub mod service_client;
pub mod throttle;
pub mod types;

pub use bootstrap::{
    CaptureController, CaptureControllerBuilder, Command, Completion, DetectorOutput, Input,
};
pub use collection::{CollectionSession, QuotaPolicy, RecordOutcome, SessionState};
pub use config_manager::{CaptureConfig, ConfigManager, StaticConfigManager, TomlConfigManager};
pub use dispatch::{BoundedQueue, OverflowPolicy, PushOutcome};
pub use error::{CaptureError, CaptureResult, ErrorKind};
pub use event_bus::{CaptureEvent, ChannelEventBus, EventBus, StatusUpdate};
pub use latest_frame::{LatestFrameReader, LatestFrameWriter};
pub use prediction_board::{DisplayedPrediction, PredictionBoard};
pub use service_client::{
    CountsClient, HttpServiceClient, InferenceClient, TrainingClient, UploadClient,
};
pub use throttle::PredictionThrottler;
pub use types::{
    Ack, CountsSnapshot, Label, LandmarkFrame, Point3D, PredictionResult, HAND_LANDMARK_COUNT,
};
