//! Business logic services.

pub mod access;
pub mod gotrue;
pub mod idea;
pub mod identity;
pub mod vote;

pub use access::{
    AccessGate, ActiveSession, CallbackOutcome, DomainPolicy, OAuthStart, SignInOutcome,
};
pub use gotrue::GoTrueClient;
pub use idea::{IdeaService, SubmitIdeaInput};
pub use identity::{AuthenticatedUser, IdentityProvider, Pkce, Session};
pub use vote::{MAX_VOTES_PER_QUARTER, QuarterBallot, VoteService, parse_vote_count};
