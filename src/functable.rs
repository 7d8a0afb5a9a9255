//-------------------------------------------------------------------//
//      parfis : 3d3v particle-in-cell simulation with Monte Carlo   //
//               collisions in bounded (cylindrical) geometries      //
//-------------------------------------------------------------------//
// This program is free software: you can redistribute it and/or     //
// modify it under the terms of the GNU General Public License as    //
// published by the Free Software Foundation, version 3.             //
// This program is distributed in the hope that it will be useful,   //
// but WITHOUT ANY WARRANTY; without even the implied warranty of    //
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU  //
// General Public License for more details at                        //
// https://www.gnu.org/licenses/gpl-3.0.html.                        //
//-------------------------------------------------------------------//

//! Piecewise uniformly binned lookup tables.
//!
//! A table covers one or more contiguous segments, each split into `nbins[s]` equal
//! bins. Rows are stored at the bin upper edges, so the row of an abscissa is found
//! with one multiplication once its segment is known.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ParfisError, Result};

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct FuncTable {
    pub ranges: Vec<f64>,                                  // segment edges
    pub nbins: Vec<usize>,                                 // bins per segment
    pub idx: Vec<f64>,                                     // inverse bin width per segment
    pub x_vec: Vec<f64>,                                   // one abscissa per row
    pub y_vec: Vec<f64>,                                   // rows of col_cnt values
    pub col_cnt: usize,
}

impl FuncTable {
    /// Empty table with the given segmentation and `col_cnt` zeroed columns.
    ///
    /// `ranges` holds either the upper edge of every segment (the first segment then
    /// starts at zero) or one extra leading value giving the start of the first segment.
    pub fn with_layout(ranges: &[f64], nbins: &[usize], col_cnt: usize) -> Result<FuncTable> {
        let mut table = FuncTable {
            ranges: ranges.to_vec(),
            nbins: nbins.to_vec(),
            idx: Vec::with_capacity(nbins.len()),
            x_vec: Vec::new(),
            y_vec: Vec::new(),
            col_cnt,
        };
        table.check_layout()?;
        for s in 0..nbins.len() {
            let (lo, hi) = table.segment(s);
            let n = nbins[s];
            table.idx.push(n as f64 / (hi - lo));
            for b in 0..n {
                table.x_vec.push(lo + (hi - lo) * (b + 1) as f64 / n as f64);
            }
        }
        table.y_vec = vec![0.0; table.x_vec.len() * col_cnt];
        Ok(table)
    }

    /// Single column table sampling `f` at every bin upper edge.
    pub fn from_fn<F: Fn(f64) -> f64>(ranges: &[f64], nbins: &[usize], f: F) -> Result<FuncTable> {
        let mut table = FuncTable::with_layout(ranges, nbins, 1)?;
        table.y_vec = table.x_vec.iter().map(|&x| f(x)).collect();
        Ok(table)
    }

    fn check_layout(&self) -> Result<()> {
        if self.nbins.is_empty() {
            return Err(ParfisError::MalformedTable(String::from("no bins declared")));
        }
        if self.ranges.len() != self.nbins.len() && self.ranges.len() != self.nbins.len() + 1 {
            return Err(ParfisError::MalformedTable(format!(
                "{} ranges do not fit {} segments",
                self.ranges.len(),
                self.nbins.len()
            )));
        }
        if self.nbins.iter().any(|&n| n == 0) {
            return Err(ParfisError::MalformedTable(String::from("empty segment")));
        }
        for s in 0..self.nbins.len() {
            let (lo, hi) = self.segment(s);
            if !(hi > lo) {
                return Err(ParfisError::MalformedTable(format!("segment {} is not increasing", s)));
            }
        }
        Ok(())
    }

    fn segment(&self, s: usize) -> (f64, f64) {
        if self.ranges.len() == self.nbins.len() {
            let lo = if s == 0 { 0.0 } else { self.ranges[s - 1] };
            (lo, self.ranges[s])
        } else {
            (self.ranges[s], self.ranges[s + 1])
        }
    }

    pub fn row_count(&self) -> usize {
        self.x_vec.len()
    }

    pub fn declared_rows(&self) -> usize {
        self.nbins.iter().sum()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.y_vec[i * self.col_cnt..(i + 1) * self.col_cnt]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let c = self.col_cnt;
        &mut self.y_vec[i * c..(i + 1) * c]
    }

    /// Row holding `x`, clamped to the table.
    pub fn row_index(&self, x: f64) -> usize {
        let mut start = 0;
        let last = self.nbins.len().saturating_sub(1);
        for s in 0..self.nbins.len() {
            let (lo, hi) = self.segment(s);
            if x < hi || s == last {
                let b = ((x - lo) * self.idx[s]).floor();
                let b = if b > 0.0 { (b as usize).min(self.nbins[s] - 1) } else { 0 };
                return start + b;
            }
            start += self.nbins[s];
        }
        0
    }

    /// Linear interpolation of column `col` between the rows bracketing `x`.
    pub fn eval(&self, x: f64, col: usize) -> f64 {
        let n = self.row_count();
        if n == 0 {
            return 0.0;
        }
        let y = |r: usize| self.y_vec[r * self.col_cnt + col];
        if x <= self.x_vec[0] {
            return y(0);
        }
        if x >= self.x_vec[n - 1] {
            return y(n - 1);
        }
        let mut hi = self.row_index(x).min(n - 1);
        while hi + 1 < n && self.x_vec[hi] < x {
            hi += 1;
        }
        while hi > 1 && self.x_vec[hi - 1] >= x {
            hi -= 1;
        }
        let lo = hi - 1;
        let t = (x - self.x_vec[lo]) / (self.x_vec[hi] - self.x_vec[lo]);
        y(lo) + t * (y(hi) - y(lo))
    }

    /// Reads the text format: `#` lines may declare `bins = [...]` and
    /// `ranges = [...]`, every other non-empty line is `x y...`.
    pub fn parse_str(text: &str) -> Result<FuncTable> {
        let mut nbins: Option<Vec<usize>> = None;
        let mut ranges: Option<Vec<f64>> = None;
        let mut x_vec = Vec::new();
        let mut y_vec = Vec::new();
        let mut col_cnt = 0;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                if let Some((key, list)) = comment.split_once('=') {
                    match key.trim() {
                        "bins" | "nbins" => nbins = Some(parse_list(list)?),
                        "ranges" => ranges = Some(parse_list(list)?),
                        _ => {}
                    }
                }
                continue;
            }
            let declared: usize = match &nbins {
                Some(b) => b.iter().sum(),
                None => return Err(ParfisError::MalformedTable(String::from("data before the bins header"))),
            };
            let row = x_vec.len();
            if row >= declared {
                return Err(ParfisError::InsufficientCapacity { declared, row });
            }
            let fields = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|f| !f.is_empty())
                .map(|f| f.parse::<f64>())
                .collect::<std::result::Result<Vec<f64>, _>>()
                .map_err(|e| ParfisError::MalformedTable(format!("row {}: {}", row, e)))?;
            if fields.len() < 2 || (row > 0 && fields.len() - 1 != col_cnt) {
                return Err(ParfisError::MalformedTable(format!("row {} has {} columns", row, fields.len())));
            }
            col_cnt = fields.len() - 1;
            x_vec.push(fields[0]);
            y_vec.extend_from_slice(&fields[1..]);
        }

        let nbins = nbins.ok_or_else(|| ParfisError::MalformedTable(String::from("missing bins header")))?;
        let ranges = ranges.ok_or_else(|| ParfisError::MalformedTable(String::from("missing ranges header")))?;
        let mut table = FuncTable::with_layout(&ranges, &nbins, col_cnt.max(1))?;
        let declared = table.declared_rows();
        if x_vec.len() != declared {
            return Err(ParfisError::RowBinMismatch { declared, rows: x_vec.len() });
        }
        table.col_cnt = col_cnt;
        table.x_vec = x_vec;
        table.y_vec = y_vec;
        Ok(table)
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<FuncTable> {
        let text = std::fs::read_to_string(path)?;
        FuncTable::parse_str(&text)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let join = |v: Vec<String>| v.join(", ");
        // writing into a String cannot fail
        let _ = writeln!(out, "# bins = [{}]", join(self.nbins.iter().map(|n| n.to_string()).collect()));
        let _ = writeln!(out, "# ranges = [{}]", join(self.ranges.iter().map(|r| format!("{:e}", r)).collect()));
        for i in 0..self.row_count() {
            let _ = write!(out, "{:e}", self.x_vec[i]);
            for y in self.row(i) {
                let _ = write!(out, "\t{:e}", y);
            }
            out.push('\n');
        }
        out
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        file.write_all(self.to_text().as_bytes())?;
        Ok(())
    }
}

fn parse_list<T: std::str::FromStr>(list: &str) -> Result<Vec<T>> {
    let inner = list.trim().trim_start_matches('[').trim_end_matches(']');
    inner
        .split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<T>().map_err(|_| ParfisError::MalformedTable(format!("bad header value {}", v))))
        .collect()
}
