use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio_modbus::ExceptionCode;
use tokio_modbus::client::{Context, Reader as _, Writer as _, rtu, tcp};
use tokio_modbus::slave::{Slave, SlaveContext as _};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, trace, warn};

/// Largest register count to request in one read. Longer ranges aren't
/// universally supported by modbus equipment.
pub const MAX_SAFE_READ_COUNT: u16 = 123;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("lookup of `{1}` failed")]
    LookupHost(#[source] std::io::Error, String),
    #[error("could not connect to `{1}` over TCP")]
    Connect(#[source] std::io::Error, String),
    #[error("could not open {1:?} for reading and writing")]
    OpenDevice(#[source] tokio_serial::Error, PathBuf),
    #[error("modbus request failed")]
    Request(#[source] tokio_modbus::Error),
    #[error("device responded with a modbus exception")]
    Exception(#[source] ExceptionCode),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("device returned {got} register values when {want} were requested")]
    ShortResponse { want: u16, got: usize },
}

/// A request-response channel to the sensor's register spaces.
///
/// The sensor side is half duplex, so implementations handle one request at a
/// time and `&mut self` reflects that.
#[async_trait]
pub trait ModbusTransport {
    /// Read `count` input registers starting at `start`.
    async fn read_registers(
        &mut self,
        device_id: u8,
        start: u16,
        count: u16,
    ) -> Result<Vec<i16>, Error>;

    /// Write a single holding register.
    ///
    /// Returns `false` when the device rejects the write with a modbus
    /// exception. Transport failures are still `Err`.
    async fn write_register(
        &mut self,
        device_id: u8,
        address: u16,
        value: i16,
    ) -> Result<bool, Error>;
}

#[derive(clap::Parser, Clone)]
#[group(id = "connection::Args")]
pub struct Args {
    #[clap(flatten)]
    how: ConnectionGroup,

    /// The modbus device ID the sensor is configured with.
    #[arg(long, short = 'i', default_value = "1")]
    device_id: u8,

    /// If the modbus response isn't received in this amount of time, consider
    /// the request failed.
    #[arg(long, default_value = "500ms")]
    timeout: humantime::Duration,

    /// The baudrate configured for the sensor's serial interface.
    ///
    /// The sensor always communicates with 8 data bits, no parity and 1 stop
    /// bit.
    #[arg(long, default_value = "19200")]
    baudrate: u32,
}

#[derive(clap::Parser, Clone)]
#[group(required = true, multiple = false)]
pub struct ConnectionGroup {
    /// Connect to the sensor over serial Modbus RTU.
    ///
    /// Specify the path to the serial device.
    #[arg(long)]
    device: Option<PathBuf>,
    /// Connect to the sensor over Modbus TCP (e.g. via a serial bridge).
    ///
    /// Specify the target as `host:port`.
    #[arg(long)]
    address: Option<String>,
}

impl Args {
    pub fn device_id(&self) -> u8 {
        self.device_id
    }
}

pub struct Connection {
    io: Context,
    timeout: Duration,
}

impl Connection {
    pub async fn new(args: &Args) -> Result<Connection, Error> {
        let io = match (&args.how.device, &args.how.address) {
            (Some(path), _) => {
                info!(message = "opening serial device", path = %path.display(), baudrate = args.baudrate);
                let stream = tokio_serial::new(path.to_string_lossy(), args.baudrate)
                    .data_bits(tokio_serial::DataBits::Eight)
                    .parity(tokio_serial::Parity::None)
                    .stop_bits(tokio_serial::StopBits::One)
                    .open_native_async()
                    .map_err(|e| Error::OpenDevice(e, path.clone()))?;
                rtu::attach_slave(stream, Slave(args.device_id))
            }
            (_, Some(address)) => {
                info!(message = "connecting...", address);
                let addresses = tokio::net::lookup_host(address)
                    .await
                    .map_err(|e| Error::LookupHost(e, address.clone()))?
                    .collect::<Vec<_>>();
                debug!(message = "resolved", ?addresses);
                let socket = TcpStream::connect(&*addresses)
                    .await
                    .map_err(|e| Error::Connect(e, address.clone()))?;
                let nodelay_result = socket.set_nodelay(true);
                trace!(message = "setting nodelay", is_error = ?nodelay_result.err());
                info!(message = "connected");
                tcp::attach_slave(socket, Slave(args.device_id))
            }
            _ => panic!("both `--device` and `--address` are `None`?"),
        };
        Ok(Connection { io, timeout: *args.timeout })
    }
}

#[async_trait]
impl ModbusTransport for Connection {
    async fn read_registers(
        &mut self,
        device_id: u8,
        start: u16,
        count: u16,
    ) -> Result<Vec<i16>, Error> {
        let timeout = self.timeout;
        self.io.set_slave(Slave(device_id));
        trace!(message = "reading input registers", start, count);
        let words = tokio::time::timeout(timeout, self.io.read_input_registers(start, count))
            .await
            .map_err(|_| Error::Timeout(timeout))?
            .map_err(Error::Request)?
            .map_err(Error::Exception)?;
        if words.len() != usize::from(count) {
            return Err(Error::ShortResponse { want: count, got: words.len() });
        }
        Ok(words.into_iter().map(|word| word as i16).collect())
    }

    async fn write_register(
        &mut self,
        device_id: u8,
        address: u16,
        value: i16,
    ) -> Result<bool, Error> {
        let timeout = self.timeout;
        self.io.set_slave(Slave(device_id));
        trace!(message = "writing holding register", address, value);
        let outcome = tokio::time::timeout(
            timeout,
            self.io.write_single_register(address, value as u16),
        )
        .await
        .map_err(|_| Error::Timeout(timeout))?
        .map_err(Error::Request)?;
        match outcome {
            Ok(()) => Ok(true),
            Err(code) => {
                warn!(message = "device rejected the write", address, exception = %code);
                Ok(false)
            }
        }
    }
}
