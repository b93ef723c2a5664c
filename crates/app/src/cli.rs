// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line arguments: which of the process family's roles this
//! invocation should run, plus the flags common to all of them.

use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "baselayer")]
pub struct Args {
    #[structopt(short, parse(from_occurrences), help = "-v => Info, -vv => Debug, -vvv => Trace")]
    pub verbose: u8,

    #[structopt(short, long, default_value = "config.toml", help = "Specify path to configuration file")]
    pub config: PathBuf,

    #[structopt(subcommand)]
    pub role: Role,
}

/// One process in the family this binary can start as. A real deployment
/// runs one of each (the API role scaled out behind a proxy), coordinated
/// by an external supervisor rather than by this binary itself.
#[derive(StructOpt, Debug)]
pub enum Role {
    /// Runs pending migrations, then serves the migration gate's status
    /// endpoint the other roles poll before they start serving traffic.
    MigrationManager,
    /// The ZeroMQ PULL/PUB forwarder other roles publish fan-out messages
    /// through.
    Broker,
    /// The authenticated websocket server browsers connect to.
    Websocket,
    /// An HTTP API handler process. `--port-offset` lets several instances
    /// of this role bind distinct ports behind a load balancer.
    Api {
        #[structopt(long, default_value = "0")]
        port_offset: u16,
    },
    /// The 503 status plane, bound where a proxy would otherwise route to
    /// an API process, serving a provisioning response until one is ready.
    Status,
}
