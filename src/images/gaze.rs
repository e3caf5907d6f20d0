// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Gaze smoothing.

Each tick the host hands the smoother one sample.  An active sample re-seeds the queue
with three points stepping from the most recent queued point toward the sample; every
tick, active or not, drains exactly one point from the front.  The drained point is the
one the compositor draws that tick.

```
use gaze_trail::images::gaze::{GazeSmoother, Point};

let mut smoother = GazeSmoother::new();
let first = smoother.push(true, true, 1.0, Point::new(90.0, 30.0));
// no history: every interpolated point sits on the sample
assert_eq!(first, Some(Point::new(90.0, 30.0)));
assert_eq!(smoother.len(), 2);
smoother.push(false, true, 1.0, Point::new(0.0, 0.0));
smoother.push(false, true, 1.0, Point::new(0.0, 0.0));
assert!(smoother.is_empty());
```
*/

use std::collections::VecDeque;
use std::ops::{Add, Mul, Sub};

/// A position in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Points appended per active sample, and the most the queue ever holds.
pub const GAZE_QUEUE_CAPACITY: usize = 3;

/// Bounded FIFO of interpolated points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GazeQueue {
    points: VecDeque<Point>,
}

impl GazeQueue {
    pub fn new() -> Self {
        GazeQueue {
            points: VecDeque::with_capacity(GAZE_QUEUE_CAPACITY * 2),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn back(&self) -> Option<Point> {
        self.points.back().copied()
    }

    pub fn front(&self) -> Option<Point> {
        self.points.front().copied()
    }

    /// Appends `point`, dropping the oldest entries beyond capacity.
    pub fn push_back(&mut self, point: Point) {
        self.points.push_back(point);
        while self.points.len() > GAZE_QUEUE_CAPACITY {
            self.points.pop_front();
        }
    }

    pub fn pop_front(&mut self) -> Option<Point> {
        self.points.pop_front()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().copied()
    }
}

/// Turns raw samples into the trail of points drawn one per tick.
#[derive(Debug, Clone, Default)]
pub struct GazeSmoother {
    queue: GazeQueue,
}

/// Interpolation step scale for a responsiveness setting.
pub fn interpolation_rate(responsiveness: f32) -> f32 {
    responsiveness * 0.9 + 0.1
}

impl GazeSmoother {
    pub fn new() -> Self {
        GazeSmoother {
            queue: GazeQueue::new(),
        }
    }

    /// Feeds one tick's sample and returns the point consumed this tick, if any.
    ///
    /// Samples are only enqueued when `is_active` and `enabled` are both set.  One point
    /// is drained regardless.
    pub fn push(
        &mut self,
        is_active: bool,
        enabled: bool,
        responsiveness: f32,
        point: Point,
    ) -> Option<Point> {
        if is_active && enabled {
            let origin = self.queue.back().unwrap_or(point);
            let rate = interpolation_rate(responsiveness);
            for i in 1..=GAZE_QUEUE_CAPACITY {
                let t = (i as f32 / GAZE_QUEUE_CAPACITY as f32) * rate;
                self.queue.push_back(origin + (point - origin) * t);
            }
        }
        self.queue.pop_front()
    }

    pub fn queue(&self) -> &GazeQueue {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
