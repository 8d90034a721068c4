//! Error types for twinkle-tree.
//!
//! Only startup can fail in a recoverable way: the window, the event loop
//! and the GPU device. Everything after that is either a per-frame surface
//! hiccup handled in the app loop or a programming error caught by an
//! assertion.

use thiserror::Error;

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("Failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support.")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reported no usable texture format.
    #[error("Surface reports no supported texture formats")]
    NoSurfaceFormat,
}

/// Errors that can occur when running the scene.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to create event loop.
    #[error("Failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_error_wraps_into_app_error() {
        let err: AppError = GpuError::NoAdapter.into();
        assert!(matches!(err, AppError::Gpu(GpuError::NoAdapter)));
        assert!(err.to_string().starts_with("GPU error: No compatible GPU adapter"));
    }

    #[test]
    fn test_app_error_source_chain() {
        use std::error::Error as _;

        let err: AppError = GpuError::NoSurfaceFormat.into();
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Surface reports no supported texture formats"));
    }
}
