//! The unit of measured work.

/// Trial-division primality check.
///
/// Odd candidates are tested against odd divisors up to `floor(sqrt(n))`.
/// The loop bound is written as `i <= n / i` so it cannot overflow near
/// `i64::MAX`.
pub fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    if n == 2 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let mut i = 3;
    while i <= n / i {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// A named predicate applied to every input element.
///
/// The name is what crosses a process boundary; worker processes resolve it
/// back to a function with [`Workload::lookup`].
#[derive(Debug, Clone, Copy)]
pub struct Workload {
    pub name: &'static str,
    pub func: fn(i64) -> bool,
}

impl Workload {
    pub const PRIME: Workload = Workload {
        name: "is_prime",
        func: is_prime,
    };

    const REGISTRY: &'static [Workload] = &[Workload::PRIME];

    pub fn new(name: &'static str, func: fn(i64) -> bool) -> Self {
        Self { name, func }
    }

    pub fn lookup(name: &str) -> Option<Workload> {
        Self::REGISTRY.iter().copied().find(|w| w.name == name)
    }

    /// True when a worker process resolving this name gets this same function.
    pub fn is_registered(&self) -> bool {
        Self::lookup(self.name).is_some_and(|w| w.func as usize == self.func as usize)
    }

    pub fn apply(&self, values: &[i64]) -> Vec<bool> {
        values.iter().map(|&n| (self.func)(n)).collect()
    }
}

impl Default for Workload {
    fn default() -> Self {
        Self::PRIME
    }
}
