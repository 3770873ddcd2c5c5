pub mod cycle_detector;
pub use cycle_detector::{
    cycle_detector, CycleDetector, CycleDetectorBuilder, CycleDetectorData, CycleDetectorError,
    CycleDetectorInput, CycleDetectorOutput, CycleDetectorParams,
};
pub mod griffiths_predictor;
pub use griffiths_predictor::{
    griffiths_predictor, GriffithsPredictor, GriffithsPredictorBuilder, GriffithsPredictorData,
    GriffithsPredictorError, GriffithsPredictorInput, GriffithsPredictorOutput,
    GriffithsPredictorParams,
};
pub mod highpass;
pub use highpass::{
    highpass, HighPassBuilder, HighPassData, HighPassError, HighPassInput, HighPassOutput,
    HighPassParams, HighPassStream,
};
pub mod supersmoother;
pub use supersmoother::{
    supersmoother, SuperSmootherBuilder, SuperSmootherData, SuperSmootherError, SuperSmootherInput,
    SuperSmootherOutput, SuperSmootherParams, SuperSmootherStream,
};
pub mod two_pole_predictor;
pub use two_pole_predictor::{
    two_pole_predictor, TwoPolePredictorBuilder, TwoPolePredictorData, TwoPolePredictorError,
    TwoPolePredictorInput, TwoPolePredictorOutput, TwoPolePredictorParams,
};
pub mod ultimate_smoother;
pub use ultimate_smoother::{
    ultimate_smoother, ultimate_smoother_batch, ultimate_smoother_batch_slice,
    UltimateSmootherBatchBuilder, UltimateSmootherBatchOutput, UltimateSmootherBatchRange,
    UltimateSmootherBuilder, UltimateSmootherData, UltimateSmootherError, UltimateSmootherInput,
    UltimateSmootherOutput, UltimateSmootherParams, UltimateSmootherStream,
};
pub mod usi;
pub use usi::{
    calculate_su_sd, usi, usi_batch, usi_batch_slice, zero_crossings, UsiBatchBuilder,
    UsiBatchOutput, UsiBatchRange, UsiBuilder, UsiData, UsiError, UsiInput, UsiOutput, UsiParams,
    UsiStream,
};
