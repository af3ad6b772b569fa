use std::fmt;

/// Errors raised by the quad renderer and the GPU helpers around it.
///
/// `Clone` so the one-shot renderer latch can hand the same failure to every
/// caller after the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The embedded shader program failed to compile.
    ShaderCompilation(String),
    /// No GPU adapter matched the request.
    AdapterUnavailable(String),
    /// The adapter refused to create a device.
    DeviceRequest(String),
    /// Copying a texture back to host memory failed.
    Readback(String),
    /// The power-of-two backing store of an image does not fit in a texture
    /// on this device.
    TextureTooLarge { width: u64, height: u64, max: u32 },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::ShaderCompilation(msg) => write!(f, "shader compilation failed: {msg}"),
            RenderError::AdapterUnavailable(msg) => write!(f, "no suitable GPU adapter: {msg}"),
            RenderError::DeviceRequest(msg) => write!(f, "failed to create GPU device: {msg}"),
            RenderError::Readback(msg) => write!(f, "texture readback failed: {msg}"),
            RenderError::TextureTooLarge { width, height, max } => write!(
                f,
                "{width}x{height} texture exceeds the device limit of {max} per side"
            ),
        }
    }
}

impl std::error::Error for RenderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let e = RenderError::ShaderCompilation("line 3: unknown identifier".into());
        assert_eq!(e.to_string(), "shader compilation failed: line 3: unknown identifier");
    }

    #[test]
    fn display_texture_too_large() {
        let e = RenderError::TextureTooLarge { width: 4096, height: 1, max: 2048 };
        assert_eq!(e.to_string(), "4096x1 texture exceeds the device limit of 2048 per side");
    }

    #[test]
    fn converts_into_anyhow() {
        let e: anyhow::Error = RenderError::Readback("map failed".into()).into();
        assert!(e.to_string().contains("map failed"));
        assert!(e.downcast_ref::<RenderError>().is_some());
    }
}
