//! Per-counterparty channel state.
//!
//! A [`Channel`] tracks everything this wallet knows about one payment-code
//! counterparty: whether the one-time notification transaction went out,
//! and how far the outgoing address sequence has advanced. Records are
//! owned exclusively by the [`ChannelStateStore`], which persists after
//! every mutation and notifies subscribers through [`ChannelEvent`]s.

mod store;
mod structs;

pub use store::{ChannelStateStore, ChannelSubscriber};
pub use structs::{Channel, ChannelEvent, ChannelStatus, NotificationStatus};
