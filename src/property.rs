use std::fmt;

/// Province delegation and municipality codes, as the registry spells them.
/// The viewer page needs both (`del=..&mun=..`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MunicipalityCodes {
    pub delegation: String,
    pub municipality: String,
}

/// A street section: type abbreviation (`CL`, `AV`, `UR`, ...) and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Street {
    pub kind: String,
    pub name: String,
}

impl Street {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// One building found by the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub number: u32,
    /// `"<kind> <name>"` of the street it was found on.
    pub street: String,
    /// Full cadastral reference (parcel + car + control characters).
    pub reference: String,
    /// First 14 characters of the reference, identifying the plot.
    pub parcel_ref: String,
    /// Built surface in m², 0 when the registry doesn't report it.
    pub built_surface: u64,
    pub year: String,
    pub usage: String,
    pub plot_surface: Option<u64>,
}
