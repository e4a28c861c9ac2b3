use candle_core::Device;

/// Request for a specific device, used by model loaders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceRequest {
    /// Use CUDA if available, otherwise CPU.
    #[default]
    Default,
    /// Force CPU even if CUDA is available.
    Cpu,
}

impl DeviceRequest {
    pub fn from_cpu_flag(cpu: bool) -> Self {
        if cpu {
            DeviceRequest::Cpu
        } else {
            DeviceRequest::Default
        }
    }

    /// Resolve the request into an actual [`Device`].
    pub fn resolve(self) -> anyhow::Result<Device> {
        match self {
            DeviceRequest::Default => Ok(Device::cuda_if_available(0)?),
            DeviceRequest::Cpu => Ok(Device::Cpu),
        }
    }
}

/// Cache-key suffix naming where a model lives.
pub fn device_key(device: &Device) -> String {
    format!("{:?}", device.location())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_flag_forces_cpu() {
        assert_eq!(DeviceRequest::from_cpu_flag(false), DeviceRequest::Default);
        let device = DeviceRequest::from_cpu_flag(true).resolve().unwrap();
        assert!(device.is_cpu());
    }
}
