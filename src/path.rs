// Path sampling for bounding boxes.
//
// The sampler does not flatten curves. Control points of cubic and quadratic
// segments are emitted as samples next to their endpoints, which is enough for
// a conservative bbox. Arcs only contribute their endpoint, so a wide arc can
// produce a bbox that is too small.
//
// Sampling is fail-soft: an unknown command or a truncated coordinate group
// ends sampling and returns the points collected so far.

pub type Point = (f32, f32);

pub fn sample_path(d: &str) -> Vec<Point> {
    let mut p = PathParser::new(d);
    let mut out = Vec::new();
    let mut cur = (0.0f32, 0.0f32);
    let mut start = (0.0f32, 0.0f32);

    while let Some(cmd) = p.next_command() {
        let rel = cmd.is_ascii_lowercase();
        let offset = |cur: Point, (x, y): Point| {
            if rel { (cur.0 + x, cur.1 + y) } else { (x, y) }
        };
        match cmd.to_ascii_uppercase() {
            'M' => {
                let Some(pair) = p.group(|p| p.next_pair()) else {
                    break;
                };
                cur = offset(cur, pair);
                start = cur;
                out.push(cur);
                // Remaining pairs are implicit line-tos.
                while let Some(pair) = p.group(|p| p.next_pair()) {
                    cur = offset(cur, pair);
                    out.push(cur);
                }
            }
            'L' | 'T' => {
                while let Some(pair) = p.group(|p| p.next_pair()) {
                    cur = offset(cur, pair);
                    out.push(cur);
                }
            }
            'H' => {
                while let Some(x) = p.group(|p| p.next_number()) {
                    cur.0 = if rel { cur.0 + x } else { x };
                    out.push(cur);
                }
            }
            'V' => {
                while let Some(y) = p.group(|p| p.next_number()) {
                    cur.1 = if rel { cur.1 + y } else { y };
                    out.push(cur);
                }
            }
            'C' => {
                while let Some((c1, c2, end)) =
                    p.group(|p| Some((p.next_pair()?, p.next_pair()?, p.next_pair()?)))
                {
                    out.push(offset(cur, c1));
                    out.push(offset(cur, c2));
                    cur = offset(cur, end);
                    out.push(cur);
                }
            }
            'S' | 'Q' => {
                while let Some((c1, end)) = p.group(|p| Some((p.next_pair()?, p.next_pair()?))) {
                    out.push(offset(cur, c1));
                    cur = offset(cur, end);
                    out.push(cur);
                }
            }
            'A' => {
                while let Some(end) = p.group(|p| {
                    p.next_number()?;
                    p.next_number()?;
                    p.next_number()?;
                    p.next_arc_flag()?;
                    p.next_arc_flag()?;
                    p.next_pair()
                }) {
                    cur = offset(cur, end);
                    out.push(cur);
                }
            }
            'Z' => {
                cur = start;
                out.push(cur);
            }
            _ => break,
        }
    }

    out
}

struct PathParser<'a> {
    bytes: &'a [u8],
    i: usize,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            i: 0,
        }
    }

    fn skip_ws(&mut self) {
        while self.i < self.bytes.len() {
            let b = self.bytes[self.i];
            if b == b' ' || b == b'\n' || b == b'\r' || b == b'\t' || b == b',' {
                self.i += 1;
            } else {
                break;
            }
        }
    }

    // Only a command letter may start a segment; stray numbers end sampling.
    fn next_command(&mut self) -> Option<char> {
        self.skip_ws();
        let b = *self.bytes.get(self.i)?;
        if !b.is_ascii_alphabetic() {
            return None;
        }
        self.i += 1;
        Some(b as char)
    }

    // Runs `f` as one all-or-nothing coordinate group.
    fn group<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let mark = self.i;
        let out = f(self);
        if out.is_none() {
            self.i = mark;
        }
        out
    }

    fn next_number(&mut self) -> Option<f32> {
        self.skip_ws();
        if self.i >= self.bytes.len() {
            return None;
        }
        let start = self.i;
        let mut has = false;

        if matches!(self.bytes[self.i], b'+' | b'-') {
            self.i += 1;
        }
        while self.i < self.bytes.len() && self.bytes[self.i].is_ascii_digit() {
            self.i += 1;
            has = true;
        }
        if self.i < self.bytes.len() && self.bytes[self.i] == b'.' {
            self.i += 1;
            while self.i < self.bytes.len() && self.bytes[self.i].is_ascii_digit() {
                self.i += 1;
                has = true;
            }
        }
        if has && self.i < self.bytes.len() && matches!(self.bytes[self.i], b'e' | b'E') {
            let mark = self.i;
            self.i += 1;
            if self.i < self.bytes.len() && matches!(self.bytes[self.i], b'+' | b'-') {
                self.i += 1;
            }
            let digits = self.i;
            while self.i < self.bytes.len() && self.bytes[self.i].is_ascii_digit() {
                self.i += 1;
            }
            if self.i == digits {
                self.i = mark;
            }
        }

        if !has {
            self.i = start;
            return None;
        }

        let s = std::str::from_utf8(&self.bytes[start..self.i]).ok()?;
        s.parse::<f32>().ok()
    }

    fn next_arc_flag(&mut self) -> Option<f32> {
        self.skip_ws();
        if self.i >= self.bytes.len() {
            return None;
        }
        match self.bytes[self.i] {
            b'0' => {
                self.i += 1;
                Some(0.0)
            }
            b'1' => {
                self.i += 1;
                Some(1.0)
            }
            _ => None,
        }
    }

    fn next_pair(&mut self) -> Option<Point> {
        let x = self.next_number()?;
        let y = self.next_number()?;
        Some((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traces_absolute_and_relative_lines() {
        let pts = sample_path("M10 10 L20 10 l0 5 z m5 5 l-2 -2 Z");
        assert_eq!(
            pts,
            vec![
                (10.0, 10.0),
                (20.0, 10.0),
                (20.0, 15.0),
                (10.0, 10.0),
                (15.0, 15.0),
                (13.0, 13.0),
                (15.0, 15.0),
            ]
        );
    }

    #[test]
    fn moveto_extra_pairs_are_lines_from_the_subpath_start() {
        let pts = sample_path("m1 1 2 2 3 3 z");
        assert_eq!(pts, vec![(1.0, 1.0), (3.0, 3.0), (6.0, 6.0), (1.0, 1.0)]);
    }

    #[test]
    fn curves_contribute_control_points() {
        let pts = sample_path("M0 0 C 0 -10 10 -10 10 0 c0 10 -10 10 -10 0");
        assert_eq!(
            pts,
            vec![
                (0.0, 0.0),
                (0.0, -10.0),
                (10.0, -10.0),
                (10.0, 0.0),
                (10.0, 10.0),
                (0.0, 10.0),
                (0.0, 0.0),
            ]
        );

        let pts = sample_path("M0 0 Q5 20 10 0 q5 -20 10 0 T30 0");
        assert_eq!(
            pts,
            vec![
                (0.0, 0.0),
                (5.0, 20.0),
                (10.0, 0.0),
                (15.0, -20.0),
                (20.0, 0.0),
                (30.0, 0.0),
            ]
        );
    }

    #[test]
    fn horizontal_and_vertical_keep_the_other_axis() {
        let pts = sample_path("M1 2 H5 v3 h-1 V0");
        assert_eq!(
            pts,
            vec![(1.0, 2.0), (5.0, 2.0), (5.0, 5.0), (4.0, 5.0), (4.0, 0.0)]
        );
    }

    #[test]
    fn arcs_only_sample_their_endpoint() {
        let pts = sample_path("M0 0 A50 50 0 0 1 10 0 a5 5 0 1,0 0 10");
        assert_eq!(pts, vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let compact = sample_path("M0 0 A5 5 0 0110 0");
        assert_eq!(compact, vec![(0.0, 0.0), (10.0, 0.0)]);
    }

    #[test]
    fn malformed_data_truncates() {
        assert_eq!(sample_path("M0 0 L10 10 X 5 5 L20 20"), vec![(0.0, 0.0), (10.0, 10.0)]);
        // A dangling coordinate ends sampling after the complete pairs.
        assert_eq!(sample_path("M0 0 L3 4 5 L9 9"), vec![(0.0, 0.0), (3.0, 4.0)]);
        assert!(sample_path("").is_empty());
        assert!(sample_path("10 10").is_empty());
    }

    #[test]
    fn packed_numbers_split_on_sign_and_dot() {
        assert_eq!(sample_path("M1-2l.5.5"), vec![(1.0, -2.0), (1.5, -1.5)]);
    }
}
