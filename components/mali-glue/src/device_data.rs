//! Static platform data handed to the Mali driver
//!
//! The downstream driver reads this record out of the device's platform
//! data, so the layout and every value are fixed. The record is encoded
//! field by field rather than transmuted, which keeps the padding bytes
//! deterministic.

use core::mem::{offset_of, size_of};
use static_assertions::const_assert_eq;

/// Number of power domains in the PMU configuration table
pub const PMU_DOMAINS: usize = 12;

/// Mali GPU platform data
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuDeviceData {
    /// Start of the frame-buffer window the GPU may write to
    pub fb_start: u64,

    /// Size of the frame-buffer window
    pub fb_size: u64,

    /// Size of the OS shared-memory pool
    pub shared_mem_size: u64,

    /// DVFS control polling interval
    pub control_interval: u32,

    /// Power-domain mask for each core
    pub pmu_domain_config: [u16; PMU_DOMAINS],

    /// Delay between power-domain switches
    pub pmu_switch_delay: u16,

    _reserved: u16,
}

const_assert_eq!(size_of::<GpuDeviceData>(), GpuDeviceData::ENCODED_LEN);
const_assert_eq!(offset_of!(GpuDeviceData, control_interval), 24);
const_assert_eq!(offset_of!(GpuDeviceData, pmu_domain_config), 28);
const_assert_eq!(offset_of!(GpuDeviceData, pmu_switch_delay), 52);

impl GpuDeviceData {
    /// Size of the encoded record
    pub const ENCODED_LEN: usize = 56;

    /// Meson GXBB/GXL values
    pub const MESON: Self = Self {
        fb_start: 0x0,
        fb_size: 0xFFFF_F000,
        shared_mem_size: 256 * 1024 * 1024,
        control_interval: 200, // 1000ms
        pmu_domain_config: [0x1, 0x2, 0x4, 0x4, 0x0, 0x0, 0x0, 0x0, 0x0, 0x1, 0x2, 0x0],
        pmu_switch_delay: 0xFFFF,
        _reserved: 0,
    };

    /// Encode the record in its `repr(C)` little-endian layout
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];

        out[0..8].copy_from_slice(&self.fb_start.to_le_bytes());
        out[8..16].copy_from_slice(&self.fb_size.to_le_bytes());
        out[16..24].copy_from_slice(&self.shared_mem_size.to_le_bytes());
        out[24..28].copy_from_slice(&self.control_interval.to_le_bytes());
        for (i, domain) in self.pmu_domain_config.iter().enumerate() {
            let at = 28 + i * 2;
            out[at..at + 2].copy_from_slice(&domain.to_le_bytes());
        }
        out[52..54].copy_from_slice(&self.pmu_switch_delay.to_le_bytes());

        out
    }

    /// Decode a record produced by [`to_bytes`](Self::to_bytes)
    ///
    /// Returns `None` if `bytes` is not exactly [`ENCODED_LEN`](Self::ENCODED_LEN) long.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; Self::ENCODED_LEN] = bytes.try_into().ok()?;

        let u64_at = |at: usize| {
            let mut word = [0u8; 8];
            word.copy_from_slice(&bytes[at..at + 8]);
            u64::from_le_bytes(word)
        };
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);

        let mut pmu_domain_config = [0u16; PMU_DOMAINS];
        for (i, domain) in pmu_domain_config.iter_mut().enumerate() {
            *domain = u16_at(28 + i * 2);
        }

        Some(Self {
            fb_start: u64_at(0),
            fb_size: u64_at(8),
            shared_mem_size: u64_at(16),
            control_interval: u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]),
            pmu_domain_config,
            pmu_switch_delay: u16_at(52),
            _reserved: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meson_values() {
        let data = GpuDeviceData::MESON;
        assert_eq!(data.fb_start, 0);
        assert_eq!(data.fb_size, 0xFFFF_F000);
        assert_eq!(data.shared_mem_size, 0x1000_0000);
        assert_eq!(data.control_interval, 200);
        assert_eq!(
            data.pmu_domain_config,
            [0x1, 0x2, 0x4, 0x4, 0x0, 0x0, 0x0, 0x0, 0x0, 0x1, 0x2, 0x0]
        );
        assert_eq!(data.pmu_switch_delay, 0xFFFF);
    }

    #[test]
    fn test_encoded_layout() {
        let bytes = GpuDeviceData::MESON.to_bytes();

        assert_eq!(&bytes[0..8], &[0; 8]);
        assert_eq!(&bytes[8..16], &[0x00, 0xF0, 0xFF, 0xFF, 0, 0, 0, 0]);
        assert_eq!(&bytes[16..24], &[0, 0, 0, 0x10, 0, 0, 0, 0]);
        assert_eq!(&bytes[24..28], &[200, 0, 0, 0]);
        assert_eq!(&bytes[28..32], &[0x1, 0, 0x2, 0]);
        assert_eq!(&bytes[46..52], &[0x1, 0, 0x2, 0, 0x0, 0]);
        assert_eq!(&bytes[52..54], &[0xFF, 0xFF]);
        assert_eq!(&bytes[54..56], &[0, 0]);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let bytes = GpuDeviceData::MESON.to_bytes();
        assert!(GpuDeviceData::from_bytes(&bytes[..55]).is_none());
        assert_eq!(GpuDeviceData::from_bytes(&bytes), Some(GpuDeviceData::MESON));
    }
}
