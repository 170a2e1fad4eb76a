use std::panic::Location;
use std::sync::Arc;

const FILTERS: [wgpu::ErrorFilter; 3] = [
    wgpu::ErrorFilter::OutOfMemory,
    wgpu::ErrorFilter::Validation,
    wgpu::ErrorFilter::Internal,
];

/// Captures backend errors raised by the GPU work between `push` and
/// `finish`. Errors are logged with the call site that opened the scope and
/// never abort the frame.
#[must_use = "an error scope must be finished to report its errors"]
pub struct ErrorScope {
    label: &'static str,
    location: &'static Location<'static>,
}

impl ErrorScope {
    #[track_caller]
    pub fn push(device: &wgpu::Device, label: &'static str) -> Self {
        for filter in FILTERS {
            device.push_error_scope(filter);
        }
        Self {
            label,
            location: Location::caller(),
        }
    }

    /// Pops the scopes in reverse push order and returns how many errors
    /// were reported.
    pub fn finish(self, device: &wgpu::Device) -> usize {
        let mut reported = 0;
        for _ in FILTERS {
            if let Some(error) = pollster::block_on(device.pop_error_scope()) {
                reported += 1;
                log::error!(
                    "GPU {} error during {} ({}:{}): {}",
                    error_kind(&error),
                    self.label,
                    self.location.file(),
                    self.location.line(),
                    error
                );
            }
        }
        reported
    }
}

/// Replaces wgpu's default handler, which panics, for errors raised outside
/// any open scope.
pub fn log_uncaptured_errors(device: &wgpu::Device) {
    device.on_uncaptured_error(Arc::new(log_uncaptured));
}

fn log_uncaptured(error: wgpu::Error) {
    log::error!("Uncaptured GPU {} error: {}", error_kind(&error), error);
}

fn error_kind(error: &wgpu::Error) -> &'static str {
    match error {
        wgpu::Error::OutOfMemory { .. } => "out-of-memory",
        wgpu::Error::Validation { .. } => "validation",
        wgpu::Error::Internal { .. } => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_error() -> wgpu::Error {
        wgpu::Error::Validation {
            source: Box::new(std::io::Error::other("surface rejected configuration")),
            description: "Surface does not support the alpha mode".to_string(),
        }
    }

    #[test]
    fn uncaptured_errors_are_logged_not_raised() {
        log_uncaptured(validation_error());
        log_uncaptured(wgpu::Error::OutOfMemory {
            source: Box::new(std::io::Error::other("no memory")),
        });
    }

    #[test]
    fn error_kinds_follow_the_scope_filters() {
        assert_eq!(error_kind(&validation_error()), "validation");
        assert_eq!(
            error_kind(&wgpu::Error::Internal {
                source: Box::new(std::io::Error::other("driver")),
                description: String::new(),
            }),
            "internal"
        );
    }
}
