//! Error taxonomy for asset loading, GPU bring-up and the event loop.
//!
//! Load errors abort the load in progress and leave whatever was displayed
//! before untouched. Device errors are fatal to the session.

use thiserror::Error;

/// Why an asset load failed.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Malformed container, header, JSON or out-of-range reference.
    #[error("{file}: {reason}")]
    Format { file: String, reason: String },

    /// A referenced external buffer is absent from the supplied file set.
    #[error("{file}: missing {kind}")]
    MissingResource { file: String, kind: String },

    /// No primitive contributed a single vertex.
    #[error("{file}: no geometry found")]
    EmptyGeometry { file: String },
}

impl LoadError {
    pub fn format(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            file: file.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(file: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::MissingResource {
            file: file.into(),
            kind: kind.into(),
        }
    }

    /// The file name the error refers to.
    pub fn file(&self) -> &str {
        match self {
            Self::Format { file, .. }
            | Self::MissingResource { file, .. }
            | Self::EmptyGeometry { file } => file,
        }
    }
}

/// GPU initialization failure. Reported once at startup.
#[derive(Debug, Error)]
pub enum DeviceInitError {
    #[error("no compatible GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("failed to create window surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("the adapter reports no usable surface format")]
    IncompatibleSurface,

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}

/// Why the viewer stopped abnormally.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Device(#[from] DeviceInitError),

    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_file() {
        let err = LoadError::format("scene.glb", "bad magic 0x00000000");
        assert_eq!(err.to_string(), "scene.glb: bad magic 0x00000000");
        assert_eq!(err.file(), "scene.glb");

        let err = LoadError::missing("scene.gltf", "buffer 'scene.bin'");
        assert_eq!(err.to_string(), "scene.gltf: missing buffer 'scene.bin'");

        let err = LoadError::EmptyGeometry {
            file: "empty.gltf".into(),
        };
        assert!(err.to_string().contains("empty.gltf"));
    }

    #[test]
    fn surface_error_is_readable() {
        let err = DeviceInitError::IncompatibleSurface;
        assert!(err.to_string().contains("surface format"));

        let err = RunError::from(DeviceInitError::IncompatibleSurface);
        assert_eq!(err.to_string(), DeviceInitError::IncompatibleSurface.to_string());
    }
}
