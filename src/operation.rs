use std::str::FromStr;
use std::{env, fmt};

use log::warn;

use crate::error::Error;
use crate::geom_in::InputGeometry;
use crate::rounder::PtRounder;
use crate::segment::SegmentArena;
use crate::sweep_line::SweepLine;
use crate::{geom_out, Geom};

/// The boolean operation to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpType {
    Union,
    Intersection,
    Xor,
    Difference,
}

impl FromStr for OpType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "union" => Ok(OpType::Union),
            "intersection" => Ok(OpType::Intersection),
            "xor" => Ok(OpType::Xor),
            "difference" => Ok(OpType::Difference),
            other => Err(Error::UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpType::Union => "union",
            OpType::Intersection => "intersection",
            OpType::Xor => "xor",
            OpType::Difference => "difference",
        };
        f.write_str(name)
    }
}

/// Environment variable capping the event queue size.
pub(crate) const MAX_QUEUE_SIZE_ENV: &str = "POLYGOL_MAX_QUEUE_SIZE";
/// Environment variable capping the number of processed sweep segments.
pub(crate) const MAX_SWEEPLINE_SEGMENTS_ENV: &str = "POLYGOL_MAX_SWEEPLINE_SEGMENTS";

const DEFAULT_MAX: usize = 1_000_000;

fn env_cap(name: &str) -> usize {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(value) => value,
            Err(_) => {
                warn!("ignoring invalid value {raw:?} for {name}; keeping default {DEFAULT_MAX}");
                DEFAULT_MAX
            }
        },
        Err(env::VarError::NotPresent) => DEFAULT_MAX,
        Err(err) => {
            warn!("ignoring unreadable value for {name} ({err}); keeping default {DEFAULT_MAX}");
            DEFAULT_MAX
        }
    }
}

/// Everything the result-membership and output phases need to know about
/// the run: the operation, how many inputs survived construction, and the
/// input arenas.
pub(crate) struct OpCtx {
    pub op_type: OpType,
    pub num_multi_polys: usize,
    pub input: InputGeometry,
}

/// Run one boolean operation over a subject and any number of clippers.
pub(crate) fn run(op_type: OpType, subject: &Geom, clippers: &[Geom]) -> Result<Geom, Error> {
    let max_queue_size = env_cap(MAX_QUEUE_SIZE_ENV);
    let max_sweep_line_segments = env_cap(MAX_SWEEPLINE_SEGMENTS_ENV);

    // every piece of mutable state is scoped to this run, so concurrent
    // operations stay independent and deterministic
    let rounder = PtRounder::new();
    let arena = SegmentArena::new();
    let mut input = InputGeometry::default();

    let subject_id = input.add_multi_poly(subject, true, &rounder, &arena)?;
    let mut multi_polys = vec![subject_id];
    for clipper in clippers {
        match input.add_multi_poly(clipper, false, &rounder, &arena) {
            Ok(id) => multi_polys.push(id),
            Err(err) => warn!("dropping clipper that failed input construction: {err}"),
        }
    }
    let num_multi_polys = multi_polys.len();

    match op_type {
        // a clipper whose bbox misses the subject entirely can't affect the
        // difference; drop it
        OpType::Difference => {
            let subject_bbox = input.multi_poly(subject_id).bbox;
            multi_polys.retain(|&id| {
                id == subject_id
                    || input
                        .multi_poly(id)
                        .bbox
                        .get_bbox_overlap(subject_bbox)
                        .is_some()
            });
        }
        // any disjoint pair of inputs empties the intersection
        OpType::Intersection => {
            for i in 0..multi_polys.len() {
                for j in (i + 1)..multi_polys.len() {
                    let a = input.multi_poly(multi_polys[i]).bbox;
                    let b = input.multi_poly(multi_polys[j]).bbox;
                    if a.get_bbox_overlap(b).is_none() {
                        return Ok(Vec::new());
                    }
                }
            }
        }
        _ => {}
    }

    // queue up all segment endpoints, ordered by sweep position
    let mut sweep_line = SweepLine::new();
    for &mp in &multi_polys {
        for event in input.sweep_events(mp) {
            sweep_line.queue_insert(&event);
            if sweep_line.queue_len() > max_queue_size {
                return Err(queue_cap_error(max_queue_size));
            }
        }
    }

    let ctx = OpCtx {
        op_type,
        num_multi_polys,
        input,
    };

    // pass the sweep line over the endpoints
    let mut prev_queue_size = sweep_line.queue_len();
    while let Some(event) = sweep_line.pop_first() {
        if sweep_line.queue_len() == prev_queue_size {
            // a queue that refuses to shrink is the usual shape of an
            // algorithmic bug; bail out instead of spinning forever
            let seg = event.segment();
            let side = if event.is_left.get() { "left" } else { "right" };
            let (lp, rp) = (seg.left_se().point.clone(), seg.right_se().point.clone());
            return Err(Error::Internal(format!(
                "Unable to pop {side} sweep event [{}, {}] of segment #{} \
                 [{}, {}] -> [{}, {}] from queue. Please file a bug report.",
                event.point.x, event.point.y, seg.id, lp.x, lp.y, rp.x, rp.y
            )));
        }
        if sweep_line.queue_len() > max_queue_size {
            return Err(queue_cap_error(max_queue_size));
        }
        if sweep_line.segments.len() > max_sweep_line_segments {
            return Err(Error::ResourceExceeded(format!(
                "Sweep line produced more than {max_sweep_line_segments} segments; \
                 raise {MAX_SWEEPLINE_SEGMENTS_ENV} if the input is genuinely this large."
            )));
        }

        let new_events = sweep_line.process(&event, &rounder, &arena)?;
        for evt in new_events {
            if !evt.is_consumed() {
                sweep_line.queue_insert(&evt);
            }
        }
        prev_queue_size = sweep_line.queue_len();
    }

    // drop the coordinate lattice before output assembly allocates
    rounder.reset();

    let rings_out = geom_out::RingOut::factory(&sweep_line.segments, &ctx)?;
    let result = geom_out::MultiPolyOut::new(rings_out, &ctx);
    Ok(result.get_geom(&ctx))
}

fn queue_cap_error(max_queue_size: usize) -> Error {
    Error::ResourceExceeded(format!(
        "Sweep event queue grew past {max_queue_size} events; \
         raise {MAX_QUEUE_SIZE_ENV} if the input is genuinely this large."
    ))
}
