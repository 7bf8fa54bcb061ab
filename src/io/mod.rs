// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Network I/O for running a [`Server`](crate::server::Server).
//!
//! The [`Server`](crate::server::Server) structure and its methods
//! implement the processing logic of the DNS server abstracted from
//! network I/O. The provider here takes a
//! [`Server`](crate::server::Server) and acts as the intermediary
//! between sockets on one hand and the query processor on the other,
//! using Tokio tasks for concurrency.

use std::time::Duration;

mod tokio;

pub use self::tokio::{TokioIoProvider, TokioShutdownController};

/// How long a TCP connection may sit idle between messages (or in the
/// middle of one) before the server closes it.
pub const DEFAULT_TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a graceful shutdown waits for in-flight work by default.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
