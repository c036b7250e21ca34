#[repr(C)]
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Config {
    write_code: bool,
    strict: bool,
    batch: bool,
}

impl Config {
    /// Validate and record everything, but never touch executable memory.
    #[must_use]
    pub fn dry_run() -> Self {
        Self::new(false, false, true)
    }

    #[must_use]
    pub fn new(write_code: bool, strict: bool, batch: bool) -> Self {
        Self {
            write_code,
            strict,
            batch,
        }
    }

    #[must_use]
    pub fn write_code(&self) -> bool {
        self.write_code
    }

    #[must_use]
    pub fn strict(&self) -> bool {
        self.strict
    }

    #[must_use]
    pub fn batch(&self) -> bool {
        self.batch
    }

    pub fn set_write_code(&mut self, write_code: bool) -> &mut Self {
        self.write_code = write_code;
        self
    }

    pub fn set_strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    pub fn set_batch(&mut self, batch: bool) -> &mut Self {
        self.batch = batch;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(true, false, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_advisory() {
        let config = Config::default();
        assert!(config.write_code());
        assert!(!config.strict());
        assert!(config.batch());
        assert!(!Config::dry_run().write_code());
    }

    #[test]
    fn setters_chain() {
        let mut config = Config::default();
        _ = config.set_strict(true).set_batch(false).set_write_code(false);
        assert_eq!(Config::new(false, true, false), config);
    }
}
