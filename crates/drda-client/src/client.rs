//! Session orchestration.
//!
//! A [`Client`] drives the DRDA conversation for one connection: it builds
//! the command group for each phase, writes it as one chained group and
//! parses the reply chains that answer it.
//!
//! ```text
//! connect ──► handshake ──► Ready ◄──► execute / query / commit / rollback
//!                             │
//!                             └──► close
//! ```
//!
//! Every phase restarts correlation ids at 1.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use bytes::Bytes;
use drda_codec::{read_chain, write_many};
use drda_protocol::{Dialect, SessionConfig, command};
use drda_types::{SqlValue, ToSql, bind_params};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::response::{Response, parse_chain};
use crate::row::ResultSet;
use crate::state::ProtocolState;

/// Attribute string sent with a Db2 cursor prepare.
const HOLD_CURSOR_ATTRIBUTES: &str = "WITH HOLD ";

/// A DRDA connection to a Derby or Db2 server.
///
/// Methods block until the full reply has been read. The client owns its
/// transport; `S` is a `TcpStream` for real connections and any
/// `Read + Write` in tests.
pub struct Client<S: Read + Write = TcpStream> {
    stream: S,
    session: SessionConfig,
    config: Config,
    state: ProtocolState,
}

impl Client<TcpStream> {
    /// Open a TCP connection and run the handshake.
    ///
    /// Configuration errors are reported before any network I/O.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = Config::new().host("localhost").database("testdb");
    /// let mut client = Client::connect(config)?;
    /// ```
    pub fn connect(config: Config) -> Result<Self> {
        let session = config.session()?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            dialect = %session.dialect(),
            "connecting to DRDA server"
        );

        let stream = open_socket(&config)?;
        Self::start(stream, config, session)
    }
}

fn open_socket(config: &Config) -> Result<TcpStream> {
    let mut last_error = None;
    for addr in (config.host.as_str(), config.port).to_socket_addrs()? {
        tracing::debug!(%addr, "establishing TCP connection");
        match TcpStream::connect_timeout(&addr, config.connect_timeout) {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                stream.set_read_timeout(config.read_timeout)?;
                stream.set_write_timeout(config.write_timeout)?;
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(%addr, error = %e, "TCP connect failed");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.map_or_else(
        || Error::Config(format!("no addresses found for {}", config.host)),
        Error::Io,
    ))
}

impl<S: Read + Write> Client<S> {
    /// Run the handshake over an already-open stream.
    pub fn handshake(stream: S, config: Config) -> Result<Self> {
        let session = config.session()?;
        Self::start(stream, config, session)
    }

    fn start(stream: S, config: Config, session: SessionConfig) -> Result<Self> {
        let mut client = Self {
            stream,
            session,
            config,
            state: ProtocolState::Ready,
        };
        client.run(Self::negotiate)?;

        tracing::info!(
            database = %client.session.database(),
            dialect = %client.session.dialect(),
            "connection established"
        );
        Ok(client)
    }

    /// EXCSAT + ACCSEC, then SECCHK + ACCRDB.
    fn negotiate(&mut self) -> Result<()> {
        tracing::debug!(dialect = %self.session.dialect(), "starting handshake");

        let exchange = [
            command::exchange_server_attributes(
                &self.config.workstation,
                command::HANDSHAKE_MANAGER_LEVELS,
            )?,
            command::access_security(&self.session),
        ];
        self.round_trip(&exchange)?;

        let security = [
            command::security_check(&self.session)?,
            command::access_database_for(&self.session)?,
        ];
        self.round_trip(&security)?;

        tracing::debug!("handshake complete");
        Ok(())
    }

    /// Execute a statement that returns no rows and commit it.
    ///
    /// Returns the number of rows affected when the server reports one.
    pub fn execute(&mut self, sql: &str) -> Result<u64> {
        self.run(|client| client.execute_statement(sql))
    }

    /// Execute a statement with `?` placeholders bound to `params`.
    pub fn execute_with(&mut self, sql: &str, params: &[&dyn ToSql]) -> Result<u64> {
        let sql = bind(sql, params)?;
        self.execute(&sql)
    }

    /// Run a query and return all of its rows.
    pub fn query(&mut self, sql: &str) -> Result<ResultSet> {
        self.run(|client| client.query_statement(sql))
    }

    /// Run a query with `?` placeholders bound to `params`.
    pub fn query_with(&mut self, sql: &str, params: &[&dyn ToSql]) -> Result<ResultSet> {
        let sql = bind(sql, params)?;
        self.query(&sql)
    }

    /// Start a transaction.
    pub fn begin(&mut self) -> Result<()> {
        self.execute("START TRANSACTION").map(drop)
    }

    /// Commit the current transaction.
    pub fn commit(&mut self) -> Result<()> {
        self.execute("COMMIT").map(drop)
    }

    /// Roll back the current transaction.
    pub fn rollback(&mut self) -> Result<()> {
        self.execute("ROLLBACK").map(drop)
    }

    /// Commit outstanding work and release the transport.
    pub fn close(mut self) -> Result<()> {
        self.run(|client| client.round_trip(&[command::commit()]).map(drop))?;
        tracing::info!(database = %self.session.database(), "connection closed");
        Ok(())
    }

    /// The session settings negotiated at connect time.
    #[must_use]
    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    /// The configuration this client was created from.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Server dialect.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.session.dialect()
    }

    /// Whether a transport or framing failure made the connection unusable.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.state == ProtocolState::Poisoned
    }

    /// Borrow the underlying stream.
    #[must_use]
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Mutably borrow the underlying stream.
    ///
    /// Reading or writing through it desynchronizes the conversation.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consume the client without the closing commit.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.stream
    }

    fn execute_statement(&mut self, sql: &str) -> Result<u64> {
        tracing::debug!(dialect = %self.session.dialect(), sql = sql, "execute");

        let mut group = self.statement_prologue()?;
        group.push(command::execute_immediate(&self.session)?);
        group.push(command::sql_statement(&self.session, sql));
        group.push(command::commit());

        let response = self.round_trip(&group)?;
        Ok(response.update_count.unwrap_or(0))
    }

    fn query_statement(&mut self, sql: &str) -> Result<ResultSet> {
        tracing::debug!(dialect = %self.session.dialect(), sql = sql, "query");

        match self.session.dialect() {
            Dialect::Derby => {
                let group = [
                    command::prepare_derby(&self.session)?,
                    command::sql_statement(&self.session, sql),
                    command::open_query_derby(&self.session)?,
                ];
                let response = self.round_trip(&group)?;
                Ok(response.into_result_set())
            }
            Dialect::Db2 => {
                let mut group = self.statement_prologue()?;
                group.push(command::prepare_db2(&self.session)?);
                group.push(command::sql_attributes(&self.session, HOLD_CURSOR_ATTRIBUTES));
                group.push(command::sql_statement(&self.session, sql));
                group.push(command::open_query_db2(&self.session)?);

                // Both chains are read before either is checked so an
                // error in the first never leaves the second on the stream.
                self.send(&group)?;
                let prologue = read_chain(&mut self.stream)?;
                let result = read_chain(&mut self.stream)?;
                parse_chain(&prologue, &self.session)?.into_result()?;
                let result = parse_chain(&result, &self.session)?.into_result()?;

                tracing::debug!("describe and close");
                self.round_trip(&[command::describe_statement(&self.session)?])?;
                match &result.query_instance {
                    Some(instance) => {
                        let close = command::close_query(&self.session, instance)?;
                        self.round_trip(&[close])?;
                    }
                    None => tracing::warn!("open query reply carried no query instance"),
                }

                Ok(result.into_result_set())
            }
        }
    }

    /// Db2 statement-set group sent ahead of every execute and query.
    fn statement_prologue(&self) -> Result<Vec<Bytes>> {
        let session = &self.session;
        if session.dialect() == Dialect::Derby {
            return Ok(Vec::new());
        }

        let mut group = vec![
            command::exchange_manager_levels(command::STATEMENT_MANAGER_LEVELS),
            command::set_sql_statement(session)?,
            command::sql_statement(
                session,
                &format!("SET CLIENT WRKSTNNAME '{}'", self.config.workstation),
            ),
        ];
        if let Some(locale) = &self.config.client_locale {
            group.push(command::sql_statement(
                session,
                &format!("SET CURRENT LOCALE LC_CTYPE='{locale}'"),
            ));
        }
        Ok(group)
    }

    /// Send one group and parse the single chain that answers it.
    fn round_trip(&mut self, group: &[Bytes]) -> Result<Response> {
        self.send(group)?;
        let units = read_chain(&mut self.stream)?;
        parse_chain(&units, &self.session)?.into_result()
    }

    fn send(&mut self, group: &[Bytes]) -> Result<()> {
        write_many(&mut self.stream, group)?;
        Ok(())
    }

    /// Run one client operation, tracking the connection state around it.
    fn run<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if !self.state.is_usable() {
            return Err(Error::ConnectionPoisoned);
        }

        self.state = ProtocolState::AwaitingResponse;
        let result = op(self);
        self.state = match &result {
            Err(e) if e.is_fatal() => {
                tracing::warn!(error = %e, "connection poisoned");
                ProtocolState::Poisoned
            }
            _ => ProtocolState::Ready,
        };
        result
    }
}

fn bind(sql: &str, params: &[&dyn ToSql]) -> Result<String> {
    let values = params
        .iter()
        .map(|p| p.to_sql())
        .collect::<std::result::Result<Vec<SqlValue>, _>>()?;
    Ok(bind_params(sql, &values)?)
}

impl<S: Read + Write> std::fmt::Debug for Client<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session", &self.session)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
