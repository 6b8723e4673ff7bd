//! Peripheral dependency mask
//!
//! Functions built against the extended layout declare which host
//! peripherals must be initialized before they run.

/// Bitset of host peripherals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralMask(u32);

impl PeripheralMask {
    pub const UART: Self = Self(1 << 0);
    pub const GPIO: Self = Self(1 << 1);
    pub const TIMER: Self = Self(1 << 2);
    pub const ADC: Self = Self(1 << 3);

    const ALL_BITS: u32 = 0xF;
    const NAMED: [(&'static str, Self); 4] = [
        ("uart", Self::UART),
        ("gpio", Self::GPIO),
        ("timer", Self::TIMER),
        ("adc", Self::ADC),
    ];

    /// No peripherals
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build from raw bits, dropping unknown ones
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL_BITS)
    }

    /// Raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check if every bit of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Look up a single peripheral by its lowercase name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMED
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, mask)| mask)
    }

    /// Names of the peripherals in this mask, lowest bit first
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMED
            .into_iter()
            .filter(move |&(_, mask)| self.contains(mask))
            .map(|(name, _)| name)
    }
}
