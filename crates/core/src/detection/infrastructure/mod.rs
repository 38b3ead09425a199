pub mod model_resolver;
pub mod onnx_ultraface_detector;
