//! # Platform
//!
//! Operating system and architecture detection, and the per-user directory that
//! hosts the default store.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatingSystem {
    Unknown,
    Windows,
    Linux,
    Android,
    MacOs,
    Solaris,
    FreeBsd,
    NetBsd,
    OpenBsd,
    DragonFlyBsd,
    UnknownBsd,
    Aix,
    Haiku,
    Illumos,
}

impl OperatingSystem {
    /// All variants in detection order
    pub const ALL: [OperatingSystem; 14] = [
        OperatingSystem::Unknown,
        OperatingSystem::Windows,
        OperatingSystem::Linux,
        OperatingSystem::Android,
        OperatingSystem::MacOs,
        OperatingSystem::Solaris,
        OperatingSystem::FreeBsd,
        OperatingSystem::NetBsd,
        OperatingSystem::OpenBsd,
        OperatingSystem::DragonFlyBsd,
        OperatingSystem::UnknownBsd,
        OperatingSystem::Aix,
        OperatingSystem::Haiku,
        OperatingSystem::Illumos,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OperatingSystem::Unknown => "Unknown",
            OperatingSystem::Windows => "Windows",
            OperatingSystem::Linux => "Linux",
            OperatingSystem::Android => "Android",
            OperatingSystem::MacOs => "macOS",
            OperatingSystem::Solaris => "Solaris",
            OperatingSystem::FreeBsd => "FreeBSD",
            OperatingSystem::NetBsd => "NetBSD",
            OperatingSystem::OpenBsd => "OpenBSD",
            OperatingSystem::DragonFlyBsd => "DragonFly BSD",
            OperatingSystem::UnknownBsd => "Unknown BSD",
            OperatingSystem::Aix => "AIX",
            OperatingSystem::Haiku => "Haiku",
            OperatingSystem::Illumos => "Illumos",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            OperatingSystem::Unknown => &["unknown"],
            OperatingSystem::Windows => &["windows", "win"],
            OperatingSystem::Linux => &["linux", "nix", "nux"],
            OperatingSystem::Android => &["android", "linux", "nix", "nux"],
            OperatingSystem::MacOs => &["mac", "darwin", "osx"],
            OperatingSystem::Solaris => &["sunos", "solaris"],
            OperatingSystem::FreeBsd => &["freebsd"],
            OperatingSystem::NetBsd => &["netbsd"],
            OperatingSystem::OpenBsd => &["openbsd"],
            OperatingSystem::DragonFlyBsd => &["dragonflybsd", "dragonfly"],
            // Only reachable through the alias pass
            OperatingSystem::UnknownBsd => &["_DO_NOT_DETECT", "bsd"],
            OperatingSystem::Aix => &["aix"],
            OperatingSystem::Haiku => &["haiku", "hrev"],
            OperatingSystem::Illumos => &["illumos", "omnios", "openindiana"],
        }
    }

    /// Prefix of native shared libraries (`lib` on Unix-likes)
    pub fn native_prefix(self) -> &'static str {
        match self {
            OperatingSystem::Unknown | OperatingSystem::Windows => "",
            _ => "lib",
        }
    }

    pub fn native_extension(self) -> &'static str {
        match self {
            OperatingSystem::Unknown => "",
            OperatingSystem::Windows => "dll",
            OperatingSystem::MacOs => "dylib",
            _ => "so",
        }
    }

    pub fn is_unix_like(self) -> bool {
        !matches!(self, OperatingSystem::Unknown | OperatingSystem::Windows)
    }

    fn condition(self, android: bool) -> bool {
        match self {
            OperatingSystem::Linux => !android,
            OperatingSystem::Android => android,
            _ => true,
        }
    }

    /// Resolve an OS name: exact display-name match first, then aliases.
    pub fn from_name(name: &str) -> OperatingSystem {
        Self::resolve(name, cfg!(target_os = "android"))
    }

    fn resolve(name: &str, android: bool) -> OperatingSystem {
        let name = normalize(name);
        let candidates = || Self::ALL.into_iter().filter(|os| os.condition(android));

        candidates()
            .find(|os| normalize(os.name()) == name)
            .or_else(|| candidates().find(|os| os.aliases().contains(&name.as_str())))
            .unwrap_or(OperatingSystem::Unknown)
    }

    pub fn current() -> OperatingSystem {
        Self::from_name(std::env::consts::OS)
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize(name: &str) -> String {
    name.to_lowercase().replace(' ', "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorType {
    Unknown,
    X86,
    X64,
}

impl ProcessorType {
    pub fn bit_size(self) -> Option<u8> {
        match self {
            ProcessorType::Unknown => None,
            ProcessorType::X86 => Some(32),
            ProcessorType::X64 => Some(64),
        }
    }

    fn byte_count(self) -> Option<usize> {
        self.bit_size().map(|bits| bits as usize / 8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    Unknown,
    X86,
    X86_64,
    Arm,
    Aarch32,
    Aarch64,
    Mips,
    Mips64,
    Ppc,
    Ppc64,
    S390x,
    SparcV9,
}

impl Architecture {
    /// All variants in detection order
    pub const ALL: [Architecture; 12] = [
        Architecture::Unknown,
        Architecture::X86,
        Architecture::X86_64,
        Architecture::Arm,
        Architecture::Aarch32,
        Architecture::Aarch64,
        Architecture::Mips,
        Architecture::Mips64,
        Architecture::Ppc,
        Architecture::Ppc64,
        Architecture::S390x,
        Architecture::SparcV9,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Architecture::Unknown => "unknown",
            Architecture::X86 => "x86",
            Architecture::X86_64 => "x86_64",
            Architecture::Arm => "arm",
            Architecture::Aarch32 => "aarch32",
            Architecture::Aarch64 => "aarch64",
            Architecture::Mips => "mips",
            Architecture::Mips64 => "mips64",
            Architecture::Ppc => "ppc",
            Architecture::Ppc64 => "ppc64",
            Architecture::S390x => "s390x",
            Architecture::SparcV9 => "sparcv9",
        }
    }

    pub fn processor_type(self) -> ProcessorType {
        match self {
            Architecture::Unknown => ProcessorType::Unknown,
            Architecture::X86_64
            | Architecture::Aarch64
            | Architecture::Mips64
            | Architecture::Ppc64
            | Architecture::S390x
            | Architecture::SparcV9 => ProcessorType::X64,
            _ => ProcessorType::X86,
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Architecture::Unknown => &[],
            Architecture::X86 => &["x86", "amd32", "i386", "i486", "i586", "i686"],
            Architecture::X86_64 => &["x86_64", "amd64", "x64"],
            Architecture::Arm => &["armv7l", "armv7", "armel", "armle", "armv", "arm"],
            Architecture::Aarch32 => &["aarch32", "arm32"],
            Architecture::Aarch64 => &["aarch64", "arm64"],
            Architecture::Mips => &["misle", "mipsel", "mips"],
            Architecture::Mips64 => &["mips64", "mips64el", "mips"],
            Architecture::Ppc => &["ppcel", "ppcle", "powerpc", "ppc"],
            Architecture::Ppc64 => &["ppc64", "powerpc64", "ppc64el", "ppc64le"],
            Architecture::S390x => &["s390x", "s390"],
            Architecture::SparcV9 => &["sparcv9", "sparc"],
        }
    }

    /// Raw architecture string of the running process, normalized
    pub fn raw() -> String {
        let value = std::env::var("PROCESSOR_ARCHITECTURE")
            .or_else(|_| std::env::var("PROCESSOR_ARCHITEW6432"))
            .unwrap_or_else(|_| std::env::consts::ARCH.to_string());
        normalize_raw_arch(&value, cfg!(target_endian = "little"))
    }

    /// Match a raw architecture string against the alias table.
    ///
    /// Aliases are scanned index by index across every architecture; a candidate is
    /// accepted when the raw name contains the alias and the processor width
    /// matches. The last accepted candidate wins.
    pub fn from_raw(raw: &str) -> Architecture {
        let raw = raw.to_lowercase();
        let byte_count = if raw.contains("64") { 8 } else { 4 };
        let table: Vec<_> = Self::ALL
            .iter()
            .map(|arch| (*arch, arch.aliases()))
            .collect();

        scan_aliases(&raw, &table, |arch| {
            arch.processor_type().byte_count() == Some(byte_count)
        })
        .unwrap_or(Architecture::Unknown)
    }

    pub fn current() -> Architecture {
        Self::from_raw(&Self::raw())
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize_raw_arch(value: &str, little_endian: bool) -> String {
    let value = value.to_lowercase();
    match value.as_str() {
        "zarch_64" => "s390x".to_string(),
        "ppc64" if little_endian => "ppc64le".to_string(),
        _ => value,
    }
}

/// Alias scan shared by the architecture lookup; keeps the last accepted match.
fn scan_aliases<T: Copy>(
    name: &str,
    table: &[(T, &[&str])],
    accept: impl Fn(T) -> bool,
) -> Option<T> {
    let widest = table.iter().map(|(_, aliases)| aliases.len()).max().unwrap_or(0);
    let mut found = None;

    for index in 0..widest {
        for (candidate, aliases) in table {
            if let Some(alias) = aliases.get(index) {
                if name.contains(alias) && accept(*candidate) {
                    found = Some(*candidate);
                }
            }
        }
    }

    found
}

/// Detected operating system and architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: OperatingSystem,
    pub arch: Architecture,
}

impl Platform {
    pub fn current() -> Self {
        Self {
            os: OperatingSystem::current(),
            arch: Architecture::current(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.os, self.arch)
    }
}

/// Per-user application data directory for `os`, falling back to the temp dir.
///
/// `env` looks up environment variables and `home` is the user's home directory.
pub fn locate_local_storage(
    os: OperatingSystem,
    env: impl Fn(&str) -> Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf, StoreError> {
    let preferred = match os {
        OperatingSystem::Windows => env("APPDATA")
            .map(PathBuf::from)
            .filter(|p| p.exists())
            .or_else(|| home.as_ref().map(|h| h.join("AppData").join("Roaming"))),
        OperatingSystem::MacOs => home
            .as_ref()
            .map(|h| h.join("Library").join("Application Support")),
        os if os.is_unix_like() => env("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| home.as_ref().map(|h| h.join(".local").join("share"))),
        _ => None,
    };

    if let Some(path) = preferred.filter(|p| p.exists()) {
        return Ok(path);
    }

    let temp = ["TMPDIR", "TEMP", "TMP"]
        .into_iter()
        .filter_map(&env)
        .map(PathBuf::from)
        .find(|p| p.exists())
        .unwrap_or_else(std::env::temp_dir);

    if temp.exists() {
        Ok(temp)
    } else {
        Err(StoreError::NoLocalStorage(temp))
    }
}
