/// Check if the host operating system runs on a 64-bit machine
///
/// This reports the machine, not the process: a 32-bit process on 64-bit
/// Windows still gets `true`.
#[must_use]
pub fn is_os_64bit() -> bool {
    #[cfg(windows)]
    {
        use windows::Win32::System::SystemInformation::{
            GetNativeSystemInfo, PROCESSOR_ARCHITECTURE_AMD64, PROCESSOR_ARCHITECTURE_ARM64,
            PROCESSOR_ARCHITECTURE_IA64,
        };

        let arch = unsafe { GetNativeSystemInfo().Anonymous.Anonymous.wProcessorArchitecture };
        [
            PROCESSOR_ARCHITECTURE_AMD64,
            PROCESSOR_ARCHITECTURE_ARM64,
            PROCESSOR_ARCHITECTURE_IA64,
        ]
        .contains(&arch)
    }

    #[cfg(not(windows))]
    {
        std::env::consts::ARCH.ends_with("64") || is_process_64bit()
    }
}

/// Check if the running process is a 64-bit process
#[must_use]
pub const fn is_process_64bit() -> bool {
    cfg!(target_pointer_width = "64")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_bitness_matches_pointer_size() {
        assert_eq!(is_process_64bit(), std::mem::size_of::<usize>() == 8);
    }

    #[test]
    fn test_64bit_process_implies_64bit_os() {
        if is_process_64bit() {
            assert!(is_os_64bit());
        }
    }
}
