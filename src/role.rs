use crate::frame::StreamId;

/// Which end of the session this is. Parity of every stream ID is derived
/// from the role: clients initiate odd streams, servers even ones.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub(crate) enum Role {
    Client,
    Server,
}

impl Role {
    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server)
    }

    pub fn is_client(&self) -> bool {
        matches!(self, Self::Client)
    }

    /// Seed for the local half's last-used stream ID. The first opened
    /// stream is seed + 2, so clients start at 3 and servers at 2.
    pub fn local_seed(&self) -> u32 {
        if self.is_client() {
            1
        } else {
            0
        }
    }

    /// The peer's seed, used to validate inbound SYN ordering.
    pub fn remote_seed(&self) -> u32 {
        if self.is_client() {
            0
        } else {
            1
        }
    }

    /// Returns true if this end initiates streams with the given ID.
    pub fn is_local_init(&self, id: StreamId) -> bool {
        self.is_client() == id.is_client_initiated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity() {
        assert!(Role::Client.is_local_init(3.into()));
        assert!(!Role::Client.is_local_init(4.into()));
        assert!(Role::Server.is_local_init(4.into()));
        assert!(!Role::Server.is_local_init(3.into()));
    }

    #[test]
    fn first_ids() {
        assert_eq!(Role::Client.local_seed() + 2, 3);
        assert_eq!(Role::Server.local_seed() + 2, 2);
    }
}
