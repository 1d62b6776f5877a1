// Channel telemetry domain model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw `/channel/{index}` payload as the device sends it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelReading {
    pub curr_inp_volts: f64,
    pub curr_out_amps: f64,
    pub curr_out_capacity: f64,
    pub curr_int_temp: f64,
    pub timestamp: i64,
    pub cells: Vec<CellReading>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CellReading {
    pub v: f64,
    pub cell: Option<usize>,
    pub balance: f64,
    pub ir: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub number: usize,
    pub volts: f64,
    pub balance: f64,
    pub ir: f64,
}

impl Cell {
    pub fn empty(number: usize) -> Self {
        Self {
            number,
            volts: 0.0,
            balance: 0.0,
            ir: 0.0,
        }
    }

    fn is_empty(&self) -> bool {
        self.volts == 0.0 && self.balance == 0.0 && self.ir == 0.0
    }
}

/// Latest telemetry for one charging bay. Identity is `index`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub index: usize,
    pub input_volts: f64,
    pub output_amps: f64,
    pub output_capacity: f64,
    pub internal_temp: f64,
    pub timestamp: i64,
    pub cells: Vec<Cell>,
    pub received_at: DateTime<Utc>,
}

impl Channel {
    /// Build a snapshot, fitting the cell list to `cell_limit`.
    ///
    /// Cells past the limit are dropped and missing ones are padded with
    /// zeroed cells. A limit of 0 keeps every cell except trailing empty ones.
    pub fn from_reading(index: usize, reading: ChannelReading, cell_limit: usize) -> Self {
        let mut cells: Vec<Cell> = reading
            .cells
            .into_iter()
            .enumerate()
            .map(|(position, c)| Cell {
                number: c.cell.unwrap_or(position),
                volts: c.v,
                balance: c.balance,
                ir: c.ir,
            })
            .collect();

        if cell_limit == 0 {
            while cells.last().is_some_and(Cell::is_empty) {
                cells.pop();
            }
        } else {
            cells.truncate(cell_limit);
            while cells.len() < cell_limit {
                cells.push(Cell::empty(cells.len()));
            }
        }

        Self {
            index,
            input_volts: reading.curr_inp_volts,
            output_amps: reading.curr_out_amps,
            output_capacity: reading.curr_out_capacity,
            internal_temp: reading.curr_int_temp,
            timestamp: reading.timestamp,
            cells,
            received_at: Utc::now(),
        }
    }

    /// Placeholder shown before the first poll of a channel completes
    pub fn empty(index: usize, cell_limit: usize) -> Self {
        let mut channel = Self::from_reading(index, ChannelReading::default(), cell_limit);
        channel.received_at = DateTime::<Utc>::UNIX_EPOCH;
        channel
    }
}
