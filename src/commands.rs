use crate::registers::RegisterAddress;

/// Resolves a command line register argument, which may be either a register
/// address or a register name.
fn resolve_register(spec: &str) -> Option<RegisterAddress> {
    match spec.parse::<u16>() {
        Ok(number) => RegisterAddress::from_raw(number),
        Err(_) => RegisterAddress::from_name(spec),
    }
}

pub mod registers {
    use crate::output;
    use crate::registers::{RegisterAddress, RegisterBank, ValueKind, ADDRESS_MAX};

    /// Search and output the known input registers of the sensor.
    #[derive(clap::Parser)]
    pub struct Args {
        #[clap(flatten)]
        output: output::Args,
        filter: Option<String>,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("could not write out the register listing")]
        Output(#[source] output::Error),
    }

    #[derive(serde::Serialize)]
    pub struct RegisterSchema {
        pub address: u16,
        pub name: &'static str,
        pub bank: RegisterBank,
        pub kind: ValueKind,
        pub scale: Option<f64>,
        pub minimum: i32,
        pub maximum: i32,
        pub pair: Option<u16>,
        pub description: &'static str,
    }

    impl RegisterSchema {
        pub fn all_registers() -> impl Iterator<Item = Self> {
            (0..=ADDRESS_MAX)
                .map_while(RegisterAddress::from_raw)
                .map(|address| {
                    let scale = address.scale();
                    RegisterSchema {
                        address: address.raw(),
                        name: address.name(),
                        bank: address.bank(),
                        kind: address.kind(),
                        scale: (scale != 0.0 && scale != 1.0).then_some(scale),
                        minimum: address.minimum(),
                        maximum: address.maximum(),
                        pair: address.paired_with().map(|pair| pair.raw()),
                        description: address.description(),
                    }
                })
        }

        pub fn is_match(&self, pattern: &str) -> bool {
            let pattern = pattern.to_uppercase();
            if self.name.contains(&pattern) {
                return true;
            }
            if self.description.to_uppercase().contains(&pattern) {
                return true;
            }
            if self.bank.to_string().to_uppercase().contains(&pattern) {
                return true;
            }
            self.address.to_string().contains(&pattern)
        }
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let mut sink = args.output.into_sink().map_err(Error::Output)?;
        sink.headers(vec![
            "Address",
            "Bank",
            "Name",
            "Type",
            "Scale",
            "Range",
            "Description",
        ])
        .map_err(Error::Output)?;
        for register in RegisterSchema::all_registers() {
            if let Some(pattern) = &args.filter {
                if !register.is_match(pattern) {
                    continue;
                }
            }
            sink.row(
                || {
                    vec![
                        register.address.to_string(),
                        register.bank.to_string(),
                        register.name.to_string(),
                        register.kind.to_string(),
                        register
                            .scale
                            .map(|scale| scale.to_string())
                            .unwrap_or_default(),
                        format!("{}..={}", register.minimum, register.maximum),
                        register.description.to_string(),
                    ]
                },
                || &register,
            )
            .map_err(Error::Output)?;
        }
        sink.finish().map_err(Error::Output)
    }
}

pub mod read {
    use crate::connection::{self, Connection};
    use crate::device::Shm31Device;
    use crate::output;
    use crate::registers::RegisterBank;
    use crate::status;

    /// Read registers from the sensor and display the decoded values.
    #[derive(clap::Parser)]
    pub struct Args {
        #[clap(flatten)]
        connection: connection::Args,
        #[clap(flatten)]
        output: output::Args,
        /// Registers to read, by name or by address.
        registers: Vec<String>,
        /// Read a whole register bank with a single request. May be repeated.
        #[arg(long, short = 'b', value_enum)]
        bank: Vec<RegisterBank>,
        /// Read the entire register map with a single request.
        #[arg(long, conflicts_with_all = ["registers", "bank"])]
        all: bool,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("`{0}` does not name a known register")]
        UnknownRegister(String),
        #[error("nothing to read, specify registers, `--bank` or `--all`")]
        NothingRequested,
        #[error("could not communicate with the sensor")]
        Communicate(#[source] connection::Error),
        #[error("could not write out the readings")]
        Output(#[source] output::Error),
    }

    #[derive(serde::Serialize)]
    struct Reading<'a> {
        address: u16,
        name: &'static str,
        raw: i16,
        value: f64,
        meaning: Option<&'a str>,
    }

    pub async fn run(args: Args) -> Result<(), Error> {
        if !args.all && args.bank.is_empty() && args.registers.is_empty() {
            return Err(Error::NothingRequested);
        }
        let targets = args
            .registers
            .iter()
            .map(|spec| {
                super::resolve_register(spec).ok_or_else(|| Error::UnknownRegister(spec.clone()))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        let connection = Connection::new(&args.connection)
            .await
            .map_err(Error::Communicate)?;
        let mut device = Shm31Device::new(connection, args.connection.device_id());
        let mut readings = Vec::new();
        if args.all {
            readings = device.read_all().await.map_err(Error::Communicate)?;
        } else {
            for bank in &args.bank {
                readings.extend(device.read_bank(*bank).await.map_err(Error::Communicate)?);
            }
            for address in targets {
                let value = device
                    .read_register(address)
                    .await
                    .map_err(Error::Communicate)?;
                readings.push((address, value));
            }
        }
        let mut sink = args.output.into_sink().map_err(Error::Output)?;
        sink.headers(vec!["Address", "Name", "Raw", "Value", "Meaning"])
            .map_err(Error::Output)?;
        for (address, value) in readings {
            let meaning = status::interpret_reading(address, &value);
            sink.row(
                || {
                    vec![
                        address.to_string(),
                        address.name().to_string(),
                        value.raw.to_string(),
                        value.to_string(),
                        meaning.clone().unwrap_or_default(),
                    ]
                },
                || Reading {
                    address: address.raw(),
                    name: address.name(),
                    raw: value.raw,
                    value: value.adjusted,
                    meaning: meaning.as_deref(),
                },
            )
            .map_err(Error::Output)?;
        }
        sink.finish().map_err(Error::Output)
    }
}

pub mod action {
    use crate::actions::SensorAction;
    use crate::connection::{self, Connection};
    use crate::device::{Shm31Device, SETTABLE_VALUE_LIMIT};

    /// Trigger one of the device actions or set a device parameter.
    ///
    /// Apply-only actions (reboot, measurement and laser control, the
    /// calibrations and the defrost triggers) are invoked bare. Settable
    /// parameters require `--value`.
    #[derive(clap::Parser)]
    pub struct Args {
        #[clap(flatten)]
        connection: connection::Args,
        /// The action to perform.
        #[arg(value_enum)]
        action: SensorAction,
        /// The value to set.
        ///
        /// The heating mode parameters accept 0 (off), 1 (automatic),
        /// 2 (start defrosting) and 3 (stop defrosting).
        #[arg(long, short = 'v')]
        value: Option<u16>,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("`{0}` requires `--value`")]
        MissingValue(SensorAction),
        #[error("`{0}` does not take a value")]
        SpuriousValue(SensorAction),
        #[error("value {0} is too large for an action register")]
        ValueTooLarge(u16),
        #[error("could not communicate with the sensor")]
        Communicate(#[source] connection::Error),
        #[error("the device did not acknowledge `{0}`")]
        NotAcknowledged(SensorAction),
    }

    pub async fn run(args: Args) -> Result<(), Error> {
        match args.value {
            None if args.action.takes_value() => return Err(Error::MissingValue(args.action)),
            Some(_) if !args.action.takes_value() => {
                return Err(Error::SpuriousValue(args.action))
            }
            Some(value) if value >= SETTABLE_VALUE_LIMIT => {
                return Err(Error::ValueTooLarge(value))
            }
            _ => {}
        }
        let connection = Connection::new(&args.connection)
            .await
            .map_err(Error::Communicate)?;
        let mut device = Shm31Device::new(connection, args.connection.device_id());
        let acknowledged = match args.value {
            Some(value) => device.perform_with_value(args.action, value).await,
            None => device.perform(args.action).await,
        }
        .map_err(Error::Communicate)?;
        if !acknowledged {
            return Err(Error::NotAcknowledged(args.action));
        }
        println!("{} acknowledged", args.action);
        Ok(())
    }
}

pub mod watch {
    use std::io::Write as _;

    use tracing::warn;

    use crate::connection::{self, Connection};
    use crate::device::Shm31Device;
    use crate::registers::{DecodedValue, RegisterAddress, RegisterBank};
    use crate::status;

    #[derive(clap::ValueEnum, Clone, Debug)]
    pub enum Format {
        Plain,
        Jsonl,
    }

    /// Poll registers at a fixed interval and emit timestamped readings.
    #[derive(clap::Parser)]
    pub struct Args {
        #[clap(flatten)]
        connection: connection::Args,
        /// Registers to poll, by name or by address.
        registers: Vec<String>,
        /// Poll a whole register bank with a single request. May be repeated.
        #[arg(long, short = 'b', value_enum)]
        bank: Vec<RegisterBank>,
        /// Time to wait between two polls.
        #[arg(long, default_value = "10s")]
        interval: humantime::Duration,
        /// Stop after this many polls.
        #[arg(long)]
        count: Option<u64>,
        #[arg(long, short = 'f', value_enum, default_value_t = Format::Plain)]
        format: Format,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("`{0}` does not name a known register")]
        UnknownRegister(String),
        #[error("nothing to poll, specify registers or `--bank`")]
        NothingRequested,
        #[error("the poll interval must not be zero")]
        ZeroInterval,
        #[error("could not connect to the sensor")]
        Connect(#[source] connection::Error),
        #[error("could not write data to the terminal")]
        WriteStdout(#[source] std::io::Error),
        #[error("could not serialize a reading to JSON")]
        SerializeJson(#[source] serde_json::Error),
    }

    #[derive(serde::Serialize)]
    struct Sample<'a> {
        time: &'a str,
        address: u16,
        name: &'static str,
        raw: i16,
        value: f64,
        meaning: Option<String>,
    }

    pub async fn run(args: Args) -> Result<(), Error> {
        if args.bank.is_empty() && args.registers.is_empty() {
            return Err(Error::NothingRequested);
        }
        if args.interval.is_zero() {
            return Err(Error::ZeroInterval);
        }
        let targets = args
            .registers
            .iter()
            .map(|spec| {
                super::resolve_register(spec).ok_or_else(|| Error::UnknownRegister(spec.clone()))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        let connection = Connection::new(&args.connection)
            .await
            .map_err(Error::Connect)?;
        let mut device = Shm31Device::new(connection, args.connection.device_id());
        let mut stdout = std::io::stdout().lock();
        let mut ticker = tokio::time::interval(*args.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut polls = 0u64;
        loop {
            ticker.tick().await;
            polls += 1;
            match gather(&mut device, &args.bank, &targets).await {
                Ok(samples) => {
                    let time = format!("{:.0}", jiff::Timestamp::now());
                    for (address, value) in samples {
                        let meaning = status::interpret_reading(address, &value);
                        match args.format {
                            Format::Plain => {
                                let suffix = match meaning {
                                    Some(label) => format!(" ({label})"),
                                    None => String::new(),
                                };
                                writeln!(
                                    stdout,
                                    "{time} {address} {name} {value}{suffix}",
                                    name = address.name(),
                                )
                                .map_err(Error::WriteStdout)?;
                            }
                            Format::Jsonl => {
                                let sample = Sample {
                                    time: &time,
                                    address: address.raw(),
                                    name: address.name(),
                                    raw: value.raw,
                                    value: value.adjusted,
                                    meaning,
                                };
                                serde_json::to_writer(&mut stdout, &sample)
                                    .map_err(Error::SerializeJson)?;
                                writeln!(stdout).map_err(Error::WriteStdout)?;
                            }
                        }
                    }
                    stdout.flush().map_err(Error::WriteStdout)?;
                }
                // A failed poll does not end the watch. The link usually
                // recovers by the next interval.
                Err(e) => warn!(
                    message = "poll failed",
                    error = (&e as &dyn std::error::Error),
                ),
            }
            if args.count.is_some_and(|count| polls >= count) {
                return Ok(());
            }
        }
    }

    async fn gather(
        device: &mut Shm31Device<Connection>,
        banks: &[RegisterBank],
        targets: &[RegisterAddress],
    ) -> Result<Vec<(RegisterAddress, DecodedValue)>, connection::Error> {
        let mut samples = Vec::new();
        for bank in banks {
            samples.extend(device.read_bank(*bank).await?);
        }
        for address in targets {
            samples.push((*address, device.read_register(*address).await?));
        }
        Ok(samples)
    }
}
