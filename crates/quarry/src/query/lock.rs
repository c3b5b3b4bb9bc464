/// Row lock strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStrength {
    Update,
    Share,
}

/// What to do when a locked row is encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOption {
    NoWait,
    SkipLocked,
}

/// A row-locking clause: strength plus at most one wait option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lock {
    pub strength: LockStrength,
    pub option: Option<LockOption>,
}

impl Lock {
    pub fn update() -> Self {
        Self {
            strength: LockStrength::Update,
            option: None,
        }
    }

    pub fn share() -> Self {
        Self {
            strength: LockStrength::Share,
            option: None,
        }
    }

    pub fn no_wait(mut self) -> Self {
        self.option = Some(LockOption::NoWait);
        self
    }

    pub fn skip_locked(mut self) -> Self {
        self.option = Some(LockOption::SkipLocked);
        self
    }

    /// `FOR UPDATE [NOWAIT | SKIP LOCKED]`
    pub fn to_sql(&self) -> String {
        let mut out = String::from(match self.strength {
            LockStrength::Update => "FOR UPDATE",
            LockStrength::Share => "FOR SHARE",
        });
        match self.option {
            Some(LockOption::NoWait) => out.push_str(" NOWAIT"),
            Some(LockOption::SkipLocked) => out.push_str(" SKIP LOCKED"),
            None => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_option_wins() {
        let lock = Lock::update().no_wait().skip_locked();
        assert_eq!(lock.to_sql(), "FOR UPDATE SKIP LOCKED");
        assert_eq!(Lock::share().no_wait().to_sql(), "FOR SHARE NOWAIT");
    }
}
