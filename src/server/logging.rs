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

//! Query logging.
//!
//! Each handled message can produce up to four log lines, one per
//! enabled hook: `request` when the question is read, `reply` with the
//! outcome, `truncated` when the TC bit is set, and `error` when the
//! response carries an error RCODE. With the prefix enabled, every line
//! starts with `[<transport> <source>#<id>]`, so that the lines of one
//! transaction can be told apart from those of concurrent ones.

use std::fmt;
use std::str::FromStr;

use log::{info, warn};

use super::{Context, ReceivedInfo, Server};
use crate::message::{ExtendedRcode, Question};

////////////////////////////////////////////////////////////////////////
// LOG OPTIONS                                                        //
////////////////////////////////////////////////////////////////////////

/// Which log hooks are enabled, and whether query-related lines are
/// prefixed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct LogOptions {
    pub request: bool,
    pub reply: bool,
    pub truncated: bool,
    pub error: bool,
    pub prefix: bool,
}

impl LogOptions {
    /// Options with every hook disabled.
    pub const NONE: Self = Self {
        request: false,
        reply: false,
        truncated: false,
        error: false,
        prefix: false,
    };

    pub fn with_prefix(mut self, prefix: bool) -> Self {
        self.prefix = prefix;
        self
    }

    fn hook_mut(&mut self, hook: &str) -> Option<&mut bool> {
        match hook {
            "request" => Some(&mut self.request),
            "reply" => Some(&mut self.reply),
            "truncated" => Some(&mut self.truncated),
            "error" => Some(&mut self.error),
            _ => None,
        }
    }
}

impl Default for LogOptions {
    /// Every hook is enabled; the prefix is not.
    fn default() -> Self {
        Self {
            request: true,
            reply: true,
            truncated: true,
            error: true,
            prefix: false,
        }
    }
}

impl FromStr for LogOptions {
    type Err = ParseLogOptionsError;

    /// Parses a comma-separated list of hooks. A hook may be prefixed
    /// with `+` (the same as no prefix) or `-`, which disables it. If
    /// the first hook has no prefix, the list names exactly the hooks
    /// to enable; otherwise it adjusts the defaults.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let mut options = if text.starts_with(['+', '-']) {
            Self::default()
        } else {
            Self::NONE
        };
        for item in text.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            let (enable, hook) = match item.strip_prefix('-') {
                Some(hook) => (false, hook),
                None => (true, item.strip_prefix('+').unwrap_or(item)),
            };
            let flag = options
                .hook_mut(&hook.to_ascii_lowercase())
                .ok_or_else(|| ParseLogOptionsError(hook.to_owned()))?;
            *flag = enable;
        }
        Ok(options)
    }
}

/// An error signaling an unknown hook in a list of log hooks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseLogOptionsError(String);

impl fmt::Display for ParseLogOptionsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "unknown log hook \"{}\" (expected request, reply, truncated, or error)",
            self.0
        )
    }
}

impl std::error::Error for ParseLogOptionsError {}

////////////////////////////////////////////////////////////////////////
// LOG LINES                                                          //
////////////////////////////////////////////////////////////////////////

impl Server {
    /// Runs the `request` hook once the question has been read.
    pub(super) fn log_request(&self, context: &Context, question: &Question) {
        if self.log_options.request {
            info!(
                "{}Request: {} {} {}",
                self.prefix(context),
                question.qname,
                question.qtype,
                question.qclass,
            );
        }
    }

    /// Runs the `reply`, `truncated`, and `error` hooks once the
    /// response is complete.
    pub(super) fn log_outcome(&self, context: &Context) {
        let rcode = context.response.extended_rcode();
        let truncated = context.response.tc();
        if self.log_options.reply {
            info!(
                "{}{} {} scope={} rcode={} answers={}{}",
                self.prefix(context),
                context.received_info.client,
                QuestionFields(context.question.as_ref()),
                ScopeField(context),
                rcode,
                context.response.ancount(),
                if truncated { " tc" } else { "" },
            );
        }
        if truncated && self.log_options.truncated {
            info!(
                "{}Truncated reply: {} (answers={}, authority={})",
                self.prefix(context),
                QuestionFields(context.question.as_ref()),
                context.response.ancount(),
                context.response.nscount(),
            );
        }
        if self.log_options.error && is_error(rcode) {
            warn!(
                "{}Error response: {} rcode={}",
                self.prefix(context),
                QuestionFields(context.question.as_ref()),
                rcode,
            );
        }
    }

    fn prefix<'a>(&self, context: &'a Context) -> Prefix<'a> {
        Prefix {
            enabled: self.log_options.prefix,
            info: &context.received_info,
            id: context.received.id(),
        }
    }
}

/// Returns whether `rcode` signals a failure to process the message
/// (as opposed to an outcome of the lookup, such as NXDOMAIN).
fn is_error(rcode: ExtendedRcode) -> bool {
    matches!(
        rcode,
        ExtendedRcode::FORMERR
            | ExtendedRcode::SERVFAIL
            | ExtendedRcode::NOTIMP
            | ExtendedRcode::BADVERS
    )
}

/// Displays the transaction prefix, if enabled.
struct Prefix<'a> {
    enabled: bool,
    info: &'a ReceivedInfo,
    id: u16,
}

impl fmt::Display for Prefix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.enabled {
            write!(f, "[{} {}#{}] ", self.info.transport, self.info.source, self.id)
        } else {
            Ok(())
        }
    }
}

/// Displays the QNAME, QTYPE, and QCLASS, or placeholders when the
/// question could not be read.
struct QuestionFields<'a>(Option<&'a Question>);

impl fmt::Display for QuestionFields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Some(question) => write!(
                f,
                "{} {} {}",
                question.qname, question.qtype, question.qclass
            ),
            None => f.write_str("- - -"),
        }
    }
}

struct ScopeField<'a, 'z, 'b>(&'a Context<'z, 'b>);

impl fmt::Display for ScopeField<'_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0.scope {
            Some(ref scope) => fmt::Display::fmt(scope, f),
            None => f.write_str("none"),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
