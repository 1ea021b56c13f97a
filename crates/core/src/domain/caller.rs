// Caller Identity

/// Member identifier
pub type MemberId = i64;

/// Authenticated member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: MemberId,
    pub email: String,
}

/// Who is making the call, as established by the Authenticator port
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Member(Principal),
}

impl Caller {
    pub fn member(id: MemberId, email: impl Into<String>) -> Self {
        Caller::Member(Principal {
            id,
            email: email.into(),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Caller::Member(_))
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Caller::Member(p) => Some(p),
            Caller::Anonymous => None,
        }
    }

    pub fn member_id(&self) -> Option<MemberId> {
        self.principal().map(|p| p.id)
    }
}

impl std::fmt::Display for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Caller::Anonymous => write!(f, "anonymous"),
            Caller::Member(p) => write!(f, "member:{}", p.id),
        }
    }
}
