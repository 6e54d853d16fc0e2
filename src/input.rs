//! Reading network definitions and plans from text files
//!
//! Both formats are line oriented. Lines starting with `#` and empty lines
//! are ignored; bracketed headers switch what the following records mean.
//!
//! Network file:
//!
//! ```text
//! [Stations]
//! S1 2
//! [Lines]
//! L1 S1 S2 3.5 1
//! [Trains]
//! T1 S1 1.5 30
//! T2 * 1 10
//! [Passengers]
//! P1 S1 S2 5 12
//! ```
//!
//! Plan file:
//!
//! ```text
//! [Train:T2]
//! 0 Start S2
//! 3 Depart L1
//! [Passenger:P1]
//! 1 Board T1
//! 4 Detrain
//! ```

use log::{debug, warn};
use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::pow;
use std::io;
use std::path::{Path, PathBuf};

use crate::simulation::{
    DuplicateId, PassengerAction, PassengerId, PlanError, StationId, Tick, TrainAction, TrainId,
    World,
};

/// Errors that can occur while reading input files
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("can not read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: can not parse '{content}': {kind}")]
    Syntax {
        line: usize,
        content: String,
        kind: SyntaxError,
    },
}

/// What was wrong with a single record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("no prior definition found")]
    NoSection,
    #[error("not matching definition for {0}")]
    Malformed(&'static str),
    #[error("invalid id '{0}'")]
    InvalidId(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("start and end same station")]
    SameEnds,
    #[error("unknown type '{0}'")]
    UnknownKind(String),
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("can not assign train to non-existing station '{0}'")]
    UnknownStation(StationId),
    #[error(transparent)]
    Duplicate(#[from] DuplicateId),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Stations,
    Lines,
    Trains,
    Passengers,
}

#[derive(Debug, Clone)]
enum PlanSection {
    Train(TrainId),
    Passenger(PassengerId),
}

/// A train record, placed once every station is known
struct TrainRecord {
    line: usize,
    content: String,
    id: TrainId,
    start: Option<StationId>,
    speed: BigRational,
    capacity: BigUint,
}

fn syntax(line: usize, content: &str, kind: impl Into<SyntaxError>) -> ParseError {
    ParseError::Syntax {
        line,
        content: content.to_owned(),
        kind: kind.into(),
    }
}

/// Meaningful lines with their 1-based line numbers
fn records(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
}

fn parse_id(s: &str) -> Result<&str, SyntaxError> {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(s)
    } else {
        Err(SyntaxError::InvalidId(s.to_owned()))
    }
}

fn parse_integer(s: &str) -> Result<BigUint, SyntaxError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SyntaxError::InvalidNumber(s.to_owned()));
    }
    s.parse()
        .map_err(|_| SyntaxError::InvalidNumber(s.to_owned()))
}

/// Parse a non-negative decimal such as `12`, `12.` or `12.25` into an exact
/// rational.
fn parse_decimal(s: &str) -> Result<BigRational, SyntaxError> {
    let invalid = || SyntaxError::InvalidNumber(s.to_owned());
    let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let numerator = parse_integer(&format!("{whole}{fraction}")).map_err(|_| invalid())?;
    let denominator = pow(BigInt::from(10u32), fraction.len());
    Ok(BigRational::new(BigInt::from(numerator), denominator))
}

fn read(path: &Path) -> Result<Option<String>, ParseError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ParseError::Io {
            path: path.to_owned(),
            source,
        }),
    }
}

/// Read a network definition. A missing file yields an empty world.
pub fn parse_network(path: impl AsRef<Path>) -> Result<World, ParseError> {
    let path = path.as_ref();
    match read(path)? {
        Some(text) => parse_network_str(&text),
        None => {
            warn!("input file '{}' not found, using an empty network", path.display());
            Ok(World::new())
        }
    }
}

/// Parse a network definition from text
pub fn parse_network_str(text: &str) -> Result<World, ParseError> {
    let mut world = World::new();
    let mut trains = Vec::new();
    let mut section = None;

    for (line, content) in records(text) {
        match content {
            "[Stations]" => section = Some(Section::Stations),
            "[Lines]" => section = Some(Section::Lines),
            "[Trains]" => section = Some(Section::Trains),
            "[Passengers]" => section = Some(Section::Passengers),
            _ => {
                let Some(current) = section else {
                    return Err(syntax(line, content, SyntaxError::NoSection));
                };
                let fields: Vec<&str> = content.split_whitespace().collect();
                let result = match current {
                    Section::Stations => parse_station(&mut world, &fields),
                    Section::Lines => parse_line(&mut world, &fields),
                    Section::Trains => parse_train(&fields).map(|(id, start, speed, capacity)| {
                        trains.push(TrainRecord {
                            line,
                            content: content.to_owned(),
                            id,
                            start,
                            speed,
                            capacity,
                        });
                    }),
                    Section::Passengers => parse_passenger(&mut world, &fields),
                };
                result.map_err(|kind| syntax(line, content, kind))?;
            }
        }
    }

    for record in trains {
        if let Some(station) = &record.start {
            if world.station(station).is_none() {
                return Err(syntax(
                    record.line,
                    &record.content,
                    SyntaxError::UnknownStation(station.clone()),
                ));
            }
        }
        world
            .add_train(record.id, record.start, record.speed, record.capacity)
            .map_err(|e| syntax(record.line, &record.content, e))?;
    }

    debug!(
        "read {} stations, {} lines, {} trains, {} passenger groups",
        world.stations().len(),
        world.lines().len(),
        world.trains().len(),
        world.passengers().len()
    );

    Ok(world)
}

fn parse_station(world: &mut World, fields: &[&str]) -> Result<(), SyntaxError> {
    let [id, capacity] = fields else {
        return Err(SyntaxError::Malformed("station"));
    };
    world.add_station(parse_id(id)?, parse_integer(capacity)?)?;
    Ok(())
}

fn parse_line(world: &mut World, fields: &[&str]) -> Result<(), SyntaxError> {
    let [id, start, end, length, capacity] = fields else {
        return Err(SyntaxError::Malformed("line"));
    };
    let (start, end) = (parse_id(start)?, parse_id(end)?);
    if start == end {
        return Err(SyntaxError::SameEnds);
    }
    world.add_line(
        parse_id(id)?,
        start,
        end,
        parse_decimal(length)?,
        parse_integer(capacity)?,
    )?;
    Ok(())
}

fn parse_train(
    fields: &[&str],
) -> Result<(TrainId, Option<StationId>, BigRational, BigUint), SyntaxError> {
    let [id, start, speed, capacity] = fields else {
        return Err(SyntaxError::Malformed("train"));
    };
    let start = match *start {
        "*" => None,
        station => Some(StationId::from(parse_id(station)?)),
    };
    Ok((
        TrainId::from(parse_id(id)?),
        start,
        parse_decimal(speed)?,
        parse_integer(capacity)?,
    ))
}

fn parse_passenger(world: &mut World, fields: &[&str]) -> Result<(), SyntaxError> {
    let [id, start, target, size, target_time] = fields else {
        return Err(SyntaxError::Malformed("passenger"));
    };
    world.add_passenger(
        parse_id(id)?,
        parse_id(start)?,
        parse_id(target)?,
        parse_integer(size)?,
        parse_integer(target_time)?,
    )?;
    Ok(())
}

/// Read a plan into `world`. A missing file is an empty plan.
pub fn parse_plan(world: &mut World, path: impl AsRef<Path>) -> Result<(), ParseError> {
    let path = path.as_ref();
    match read(path)? {
        Some(text) => parse_plan_str(world, &text),
        None => {
            warn!("plan file '{}' not found, using an empty plan", path.display());
            Ok(())
        }
    }
}

/// Parse a plan from text into `world`
pub fn parse_plan_str(world: &mut World, text: &str) -> Result<(), ParseError> {
    let mut section = None;

    for (line, content) in records(text) {
        if let Some(header) = content.strip_prefix('[') {
            section = Some(parse_plan_header(header).map_err(|kind| syntax(line, content, kind))?);
            continue;
        }

        let result = match &section {
            None => Err(SyntaxError::NoSection),
            Some(PlanSection::Train(id)) => parse_train_action(content)
                .and_then(|(tick, action)| Ok(world.schedule_train(id, tick, action)?)),
            Some(PlanSection::Passenger(id)) => parse_passenger_action(content)
                .and_then(|(tick, action)| Ok(world.schedule_passenger(id, tick, action)?)),
        };
        result.map_err(|kind| syntax(line, content, kind))?;
    }

    Ok(())
}

fn parse_plan_header(header: &str) -> Result<PlanSection, SyntaxError> {
    let header = header.trim().trim_end_matches(']');
    let Some((kind, id)) = header.split_once(':') else {
        return Err(SyntaxError::Malformed("plan header"));
    };
    let id = parse_id(id)?;
    match kind {
        "Train" => Ok(PlanSection::Train(TrainId::from(id))),
        "Passenger" => Ok(PlanSection::Passenger(PassengerId::from(id))),
        other => Err(SyntaxError::UnknownKind(other.to_owned())),
    }
}

fn parse_train_action(content: &str) -> Result<(Tick, TrainAction), SyntaxError> {
    let fields: Vec<&str> = content.split_whitespace().collect();
    let [tick, action, id] = fields.as_slice() else {
        return Err(SyntaxError::Malformed("train action"));
    };
    let tick = parse_integer(tick)?;
    let id = parse_id(id)?;
    let action = match *action {
        "Start" => TrainAction::Start(StationId::from(id)),
        "Depart" => TrainAction::Depart(id.into()),
        other => return Err(SyntaxError::UnknownAction(other.to_owned())),
    };
    Ok((tick, action))
}

fn parse_passenger_action(content: &str) -> Result<(Tick, PassengerAction), SyntaxError> {
    let fields: Vec<&str> = content.split_whitespace().collect();
    match fields.as_slice() {
        [tick, "Board", id] => Ok((
            parse_integer(tick)?,
            PassengerAction::Board(TrainId::from(parse_id(id)?)),
        )),
        [tick, "Detrain"] => Ok((parse_integer(tick)?, PassengerAction::Detrain)),
        // A trailing train id is tolerated and ignored
        [tick, "Detrain", id] => {
            parse_id(id)?;
            Ok((parse_integer(tick)?, PassengerAction::Detrain))
        }
        [_, action, ..] if *action != "Board" && *action != "Detrain" => {
            Err(SyntaxError::UnknownAction((*action).to_owned()))
        }
        _ => Err(SyntaxError::Malformed("passenger action")),
    }
}

/// Read the network and then the plan
pub fn load(input: impl AsRef<Path>, plan: impl AsRef<Path>) -> Result<World, ParseError> {
    let mut world = parse_network(input)?;
    parse_plan(&mut world, plan)?;
    Ok(world)
}
