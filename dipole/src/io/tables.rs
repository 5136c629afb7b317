//! Plain-text numeric tables: dipole snapshots, observable series and
//! arrow fields for external renderers
//!
//! Columns are whitespace separated; `#` starts a comment line.

use crate::lattice::Lattice;
use crate::state::DipoleState;
use color_eyre::eyre::{eyre, Result, WrapErr};
use nalgebra::Vector2;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// One `px py` row per dipole, in index order
pub fn write_snapshot<W: Write>(writer: &mut W, state: &DipoleState) -> Result<()> {
    for (px, py) in state.px.iter().zip(&state.py) {
        writeln!(writer, "{:.18e} {:.18e}", px, py)?;
    }
    Ok(())
}

pub fn read_snapshot<R: BufRead>(reader: R) -> Result<Vec<Vector2<f64>>> {
    Ok(read_rows::<_, 2>(reader)?
        .into_iter()
        .map(|[x, y]| Vector2::new(x, y))
        .collect())
}

pub fn save_snapshot<P: AsRef<Path>>(path: P, state: &DipoleState) -> Result<()> {
    let path = path.as_ref();
    let mut writer = create(path)?;
    write_snapshot(&mut writer, state)?;
    writer.flush()?;
    Ok(())
}

pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Vec<Vector2<f64>>> {
    let path = path.as_ref();
    let file = File::open(path)
        .wrap_err_with(|| format!("Unable to open snapshot: {}", path.display()))?;
    read_snapshot(BufReader::new(file))
        .wrap_err_with(|| format!("Malformed snapshot: {}", path.display()))
}

/// Two columns: independent variable and sampled observable, in sample order
pub fn write_series<W: Write>(writer: &mut W, series: &[(f64, f64)]) -> Result<()> {
    for (x, y) in series {
        writeln!(writer, "{:.18e} {:.18e}", x, y)?;
    }
    Ok(())
}

pub fn save_series<P: AsRef<Path>>(path: P, series: &[(f64, f64)]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = create(path)?;
    write_series(&mut writer, series)?;
    writer.flush()?;
    Ok(())
}

pub fn load_series<P: AsRef<Path>>(path: P) -> Result<Vec<(f64, f64)>> {
    let path = path.as_ref();
    let file = File::open(path)
        .wrap_err_with(|| format!("Unable to open series: {}", path.display()))?;
    Ok(read_rows::<_, 2>(BufReader::new(file))?
        .into_iter()
        .map(|[x, y]| (x, y))
        .collect())
}

/// `x y px py` per dipole: the position and moment an arrow plot needs
pub fn write_arrow_field<W: Write>(
    writer: &mut W,
    lattice: &Lattice,
    state: &DipoleState,
) -> Result<()> {
    if lattice.len() != state.len() {
        return Err(eyre!(
            "lattice has {} sites but the state has {} dipoles",
            lattice.len(),
            state.len()
        ));
    }
    writeln!(writer, "# x y px py")?;
    for i in 0..lattice.len() {
        writeln!(
            writer,
            "{:.18e} {:.18e} {:.18e} {:.18e}",
            lattice.x[i], lattice.y[i], state.px[i], state.py[i]
        )?;
    }
    Ok(())
}

/// Writes arrow-field frames into a directory, named by a running index
/// unless the caller supplies a name.
#[derive(Debug)]
pub struct FrameWriter {
    dir: PathBuf,
    next_index: usize,
}

impl FrameWriter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .wrap_err_with(|| format!("Unable to create frame directory: {}", dir.display()))?;
        Ok(Self { dir, next_index: 0 })
    }

    pub fn save(
        &mut self,
        lattice: &Lattice,
        state: &DipoleState,
        name: Option<&str>,
    ) -> Result<PathBuf> {
        let path = match name {
            Some(name) => self.dir.join(format!("{name}.dat")),
            None => self.dir.join(format!("{}.dat", self.next_index)),
        };
        let mut writer = create(&path)?;
        write_arrow_field(&mut writer, lattice, state)?;
        writer.flush()?;
        self.next_index += 1;
        Ok(path)
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .wrap_err_with(|| format!("Unable to create file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn read_rows<R: BufRead, const N: usize>(reader: R) -> Result<Vec<[f64; N]>> {
    let mut rows = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .collect();
        if fields.len() != N {
            return Err(eyre!(
                "line {}: expected {} columns, found {}",
                line_no + 1,
                N,
                fields.len()
            ));
        }

        let mut row = [0.0; N];
        for (value, field) in row.iter_mut().zip(&fields) {
            *value = field
                .parse()
                .wrap_err_with(|| format!("line {}: invalid number '{}'", line_no + 1, field))?;
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::LatticeKind;
    use crate::orientation::OrientationBasis;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    #[test]
    fn test_snapshot_round_trip() {
        let basis = OrientationBasis::new(7, 0.08789).unwrap();
        let state = DipoleState::random(30, &basis, &mut StdRng::seed_from_u64(9));

        let mut buffer = Vec::new();
        write_snapshot(&mut buffer, &state).unwrap();
        let moments = read_snapshot(Cursor::new(buffer)).unwrap();

        assert_eq!(moments.len(), state.len());
        for (i, p) in moments.iter().enumerate() {
            assert_relative_eq!(p.x, state.px[i], epsilon = 1e-12);
            assert_relative_eq!(p.y, state.py[i], epsilon = 1e-12);
        }
        let reloaded = DipoleState::from_moments(&moments, 30).unwrap();
        assert_eq!(reloaded, state);
    }

    #[test]
    fn test_reader_skips_comments_and_accepts_commas() {
        let text = "# saved state\n\n1.0 2.0\n-0.5,0.25\n";
        let moments = read_snapshot(Cursor::new(text)).unwrap();
        assert_eq!(moments, vec![Vector2::new(1.0, 2.0), Vector2::new(-0.5, 0.25)]);
    }

    #[test]
    fn test_reader_rejects_bad_rows() {
        assert!(read_snapshot(Cursor::new("1.0 2.0 3.0\n")).is_err());
        assert!(read_snapshot(Cursor::new("1.0 abc\n")).is_err());
    }

    #[test]
    fn test_series_and_frames_on_disk() {
        let dir = tempfile::tempdir().unwrap();

        let series = vec![(0.0, -1.5), (10.0, -1.25), (20.0, 0.125)];
        let path = dir.path().join("UvsT.dat");
        save_series(&path, &series).unwrap();
        assert_eq!(load_series(&path).unwrap(), series);

        let lattice = Lattice::generate(1.1, 2, 2, LatticeKind::Square).unwrap();
        let state = DipoleState::uniform(4, Vector2::new(0.0, 0.1));
        let mut frames = FrameWriter::new(dir.path().join("frames")).unwrap();
        let first = frames.save(&lattice, &state, None).unwrap();
        let named = frames.save(&lattice, &state, Some("seed")).unwrap();
        let second = frames.save(&lattice, &state, None).unwrap();
        assert!(first.ends_with("0.dat"));
        assert!(named.ends_with("seed.dat"));
        assert!(second.ends_with("2.dat"));

        let content = fs::read_to_string(&first).unwrap();
        let rows: Vec<&str> = content.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].split_whitespace().count(), 4);
    }
}
