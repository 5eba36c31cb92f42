//! The output database (ODB): the append-only, line-oriented file format
//! analysis results are written to and read back from.
//!
//! A file is a sequence of `$FRAME` blocks, each holding the mesh for that
//! frame plus its node and global output. Read mode loads the whole file
//! once and records the byte offset of each frame's data sections, so
//! repeated lookups don't re-scan the file.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::{ElementType, Mesh};
use crate::types::ModelingSpace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdbMode {
    Read,
    Write,
}

struct FrameIndex {
    description_offset: usize,
    nodes: (usize, usize),
    elements: (usize, usize),
    node_output_titles: (usize, usize),
    node_output_values: (usize, usize),
    global_output_titles: (usize, usize),
    global_output_values: (usize, usize),
}

/// An output database file, open for either sequential writing or random-
/// access reading.
pub struct Odb {
    file_path: PathBuf,
    mode: OdbMode,
    frame_count: usize,
    current_frame: usize,
    content: String,
    frames: Vec<FrameIndex>,
}

fn element_type_name(element_type: ElementType) -> &'static str {
    match element_type {
        ElementType::Line2 => "Line2",
        ElementType::Line3 => "Line3",
        ElementType::Plane3 => "Plane3",
        ElementType::Plane4 => "Plane4",
        ElementType::Plane6 => "Plane6",
        ElementType::Plane8 => "Plane8",
        ElementType::Volume4 => "Volume4",
        ElementType::Volume6 => "Volume6",
        ElementType::Volume8 => "Volume8",
        ElementType::Volume10 => "Volume10",
        ElementType::Volume15 => "Volume15",
        ElementType::Volume20 => "Volume20",
    }
}

fn element_type_from_name(name: &str) -> Result<ElementType> {
    Ok(match name {
        "Line2" => ElementType::Line2,
        "Line3" => ElementType::Line3,
        "Plane3" => ElementType::Plane3,
        "Plane4" => ElementType::Plane4,
        "Plane6" => ElementType::Plane6,
        "Plane8" => ElementType::Plane8,
        "Volume4" => ElementType::Volume4,
        "Volume6" => ElementType::Volume6,
        "Volume8" => ElementType::Volume8,
        "Volume10" => ElementType::Volume10,
        "Volume15" => ElementType::Volume15,
        "Volume20" => ElementType::Volume20,
        other => return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unrecognized element type in output database: '{other}'"),
        ))),
    })
}

/// Parses a `$COMMAND <count>` header line, returning the count.
fn parse_count(line: &str) -> Result<usize> {
    let token = line.trim().rsplit(' ').next().unwrap_or(line);
    token.parse::<usize>().map_err(|_| {
        Error::MalformedOdb(format!("invalid count in output database header: '{line}'"))
    })
}

impl Odb {
    pub fn new(file_path: impl AsRef<Path>, mode: OdbMode, replace: bool) -> Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();

        if replace && file_path.is_file() {
            if mode == OdbMode::Read {
                return Err(Error::InvalidInput(
                    "cannot replace existing output database in read-only mode".into(),
                ));
            }
            fs::remove_file(&file_path)?;
        }

        if mode == OdbMode::Write && !file_path.is_file() {
            fs::write(&file_path, "")?;
        }
        if mode == OdbMode::Read && !file_path.is_file() {
            return Err(Error::InvalidInput(format!(
                "output database not found: '{}'",
                file_path.display()
            )));
        }

        let mut odb = Self {
            file_path,
            mode,
            frame_count: 0,
            current_frame: 0,
            content: String::new(),
            frames: Vec::new(),
        };

        if mode == OdbMode::Read {
            odb.content = fs::read_to_string(&odb.file_path)?;
            odb.index_frames()?;
            if odb.frame_count == 0 {
                return Err(Error::MissingFrame);
            }
            odb.current_frame = odb.frame_count - 1;
        }

        Ok(odb)
    }

    fn index_frames(&mut self) -> Result<()> {
        let mut frames = Vec::new();
        let mut pointers: Option<HashMap<String, (String, usize)>> = None;
        let mut offset = 0usize;
        let lines = self.content.split_inclusive('\n');

        for raw_line in lines {
            let line = raw_line.trim();
            let next_offset = offset + raw_line.len();
            if line.starts_with('$') {
                match line {
                    "$FRAME" => {
                        if pointers.is_some() {
                            return Err(Error::MalformedOdb(
                                "'$FRAME' encountered before the previous frame's '$END_FRAME'"
                                    .into(),
                            ));
                        }
                        pointers = Some(HashMap::new());
                    }
                    "$END_FRAME" => {
                        let map = pointers.take().ok_or_else(|| {
                            Error::MalformedOdb("'$END_FRAME' with no matching '$FRAME'".into())
                        })?;
                        frames.push(map);
                    }
                    _ => {
                        if let Some(map) = pointers.as_mut() {
                            let command = line.split(' ').next().unwrap_or(line).to_string();
                            map.insert(command, (line.to_string(), next_offset));
                        }
                    }
                }
            }
            offset = next_offset;
        }

        if pointers.is_some() {
            return Err(Error::MalformedOdb(
                "output database ends with an unterminated frame (missing '$END_FRAME')".into(),
            ));
        }

        self.frame_count = frames.len();
        self.frames = frames
            .into_iter()
            .map(|map| {
                let count = |key: &str| -> Result<(usize, usize)> {
                    match map.get(key) {
                        Some((h, o)) => Ok((parse_count(h)?, *o)),
                        None => Ok((0, 0)),
                    }
                };
                Ok(FrameIndex {
                    description_offset: map.get("$DESCRIPTION").map(|(_, o)| *o).unwrap_or(0),
                    nodes: count("$NODES")?,
                    elements: count("$ELEMENTS")?,
                    node_output_titles: count("$NODE_OUTPUT_TITLES")?,
                    node_output_values: count("$NODE_OUTPUT_VALUES")?,
                    global_output_titles: count("$GLOBAL_OUTPUT_TITLES")?,
                    global_output_values: count("$GLOBAL_OUTPUT_VALUES")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn file_name(&self) -> String {
        self.file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn lines_at(&self, offset: usize, count: usize) -> impl Iterator<Item = &str> {
        self.content[offset..].lines().take(count)
    }

    /// Writes the next output frame to file (write mode only).
    pub fn write_next_frame(
        &mut self,
        description: &str,
        mesh: &Mesh,
        node_output: &[(String, Vec<f64>)],
        global_output: &[(String, f64)],
    ) -> Result<()> {
        self.frame_count += 1;
        self.current_frame = self.frame_count - 1;

        let mut file = fs::OpenOptions::new().append(true).open(&self.file_path)?;

        write!(file, "$FRAME\n{}\n\n", self.current_frame)?;
        write!(file, "$DESCRIPTION\n{description}\n\n")?;

        writeln!(file, "$NODES {}", mesh.node_count())?;
        for node in mesh.nodes() {
            writeln!(file, "{}, {}, {}", node.x, node.y, node.z)?;
        }
        writeln!(file)?;

        writeln!(file, "$ELEMENTS {}", mesh.element_count())?;
        for element in mesh.elements() {
            let connectivity = element
                .node_indices
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(file, "{}, {}", element_type_name(element.element_type), connectivity)?;
        }
        writeln!(file)?;

        writeln!(file, "$NODE_OUTPUT_TITLES {}", node_output.len())?;
        for (title, _) in node_output {
            writeln!(file, "{title}")?;
        }
        writeln!(file)?;

        let node_output_rows = if node_output.is_empty() { 0 } else { mesh.node_count() };
        writeln!(file, "$NODE_OUTPUT_VALUES {node_output_rows}")?;
        for row in 0..node_output_rows {
            let values = node_output
                .iter()
                .map(|(_, values)| values[row].to_string())
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(file, "{values}")?;
        }
        writeln!(file)?;

        writeln!(file, "$GLOBAL_OUTPUT_TITLES {}", global_output.len())?;
        for (title, _) in global_output {
            writeln!(file, "{title}")?;
        }
        writeln!(file)?;

        writeln!(file, "$GLOBAL_OUTPUT_VALUES {}", global_output.len())?;
        for (_, value) in global_output {
            writeln!(file, "{value}")?;
        }
        writeln!(file)?;

        writeln!(file, "$END_FRAME")?;
        writeln!(file)?;
        Ok(())
    }

    fn frame(&self) -> &FrameIndex {
        &self.frames[self.current_frame]
    }

    pub fn description(&self) -> String {
        self.content[self.frame().description_offset..]
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    pub fn nodes(&self) -> Vec<[f64; 3]> {
        let (count, offset) = self.frame().nodes;
        self.lines_at(offset, count)
            .map(|line| {
                let mut parts = line.split(',').map(|s| s.trim().parse::<f64>().unwrap_or(0.0));
                [
                    parts.next().unwrap_or(0.0),
                    parts.next().unwrap_or(0.0),
                    parts.next().unwrap_or(0.0),
                ]
            })
            .collect()
    }

    pub fn elements(&self) -> Result<Vec<(ElementType, Vec<usize>)>> {
        let (count, offset) = self.frame().elements;
        self.lines_at(offset, count)
            .map(|line| {
                let mut parts = line.splitn(2, ',');
                let type_name = parts.next().unwrap_or("").trim();
                let connectivity = parts
                    .next()
                    .unwrap_or("")
                    .split(',')
                    .filter_map(|s| s.trim().parse::<usize>().ok())
                    .collect();
                Ok((element_type_from_name(type_name)?, connectivity))
            })
            .collect()
    }

    pub fn node_output_titles(&self) -> Vec<String> {
        let (count, offset) = self.frame().node_output_titles;
        self.lines_at(offset, count).map(|l| l.trim().to_string()).collect()
    }

    pub fn global_output_titles(&self) -> Vec<String> {
        let (count, offset) = self.frame().global_output_titles;
        self.lines_at(offset, count).map(|l| l.trim().to_string()).collect()
    }

    pub fn node_output_values(&self, title: &str) -> Result<Vec<f64>> {
        let titles = self.node_output_titles();
        let index = titles
            .iter()
            .position(|t| t == title)
            .ok_or_else(|| Error::InvalidInput(format!("unknown node output title '{title}'")))?;
        let (count, offset) = self.frame().node_output_values;
        Ok(self
            .lines_at(offset, count)
            .map(|line| {
                line.split(',')
                    .nth(index)
                    .and_then(|s| s.trim().parse::<f64>().ok())
                    .unwrap_or(f64::NAN)
            })
            .collect())
    }

    pub fn global_output_values(&self, title: &str) -> Result<f64> {
        let titles = self.global_output_titles();
        let index = titles
            .iter()
            .position(|t| t == title)
            .ok_or_else(|| Error::InvalidInput(format!("unknown global output title '{title}'")))?;
        let (count, offset) = self.frame().global_output_values;
        Ok(self
            .lines_at(offset, count)
            .nth(index)
            .and_then(|l| l.trim().parse::<f64>().ok())
            .unwrap_or(f64::NAN))
    }

    pub fn go_to_first_frame(&mut self) {
        self.current_frame = 0;
    }

    pub fn go_to_previous_frame(&mut self) {
        self.current_frame = self.current_frame.saturating_sub(1);
    }

    pub fn go_to_next_frame(&mut self) {
        if self.current_frame + 1 < self.frame_count {
            self.current_frame += 1;
        }
    }

    pub fn go_to_last_frame(&mut self) {
        self.current_frame = self.frame_count - 1;
    }

    pub fn go_to_frame(&mut self, frame: usize) -> Result<()> {
        if frame >= self.frame_count {
            return Err(Error::InvalidInput("invalid frame".into()));
        }
        self.current_frame = frame;
        Ok(())
    }

    /// Merges selected frames from one or more existing output databases into
    /// a single new output database file, replacing it if it already exists.
    pub fn merge(
        file_path: impl AsRef<Path>,
        selection: &[(PathBuf, Vec<usize>)],
        descriptions: &[String],
        delete_existing: bool,
    ) -> Result<()> {
        let file_path = file_path.as_ref();
        if file_path.is_file() {
            fs::remove_file(file_path)?;
        }
        let mut new_odb = Odb::new(file_path, OdbMode::Write, false)?;

        let mut count = 0usize;
        for (old_path, frames) in selection {
            let mut old_odb = Odb::new(old_path, OdbMode::Read, false)?;
            for &frame in frames {
                old_odb.go_to_frame(frame)?;
                let description = if descriptions.is_empty() {
                    old_odb.description()
                } else {
                    descriptions[count].clone()
                };
                let coords = old_odb.nodes();
                let connectivity = old_odb.elements()?;
                let modeling_space = connectivity
                    .first()
                    .map(|(ty, _)| ty.modeling_space())
                    .unwrap_or(ModelingSpace::ThreeDimensional);
                let mesh = Mesh::new(coords, connectivity, modeling_space);

                let node_output: Vec<(String, Vec<f64>)> = old_odb
                    .node_output_titles()
                    .into_iter()
                    .map(|title| {
                        let values = old_odb.node_output_values(&title).unwrap_or_default();
                        (title, values)
                    })
                    .collect();
                let global_output: Vec<(String, f64)> = old_odb
                    .global_output_titles()
                    .into_iter()
                    .map(|title| {
                        let value = old_odb.global_output_values(&title).unwrap_or(f64::NAN);
                        (title, value)
                    })
                    .collect();

                new_odb.write_next_frame(&description, &mesh, &node_output, &global_output)?;
                count += 1;
            }
        }

        if delete_existing {
            for (old_path, _) in selection {
                fs::remove_file(old_path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementType;
    use crate::types::ModelingSpace;

    fn sample_mesh() -> Mesh {
        Mesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![(ElementType::Plane4, vec![0, 1, 2, 3])],
            ModelingSpace::TwoDimensional,
        )
    }

    #[test]
    fn round_trips_a_frame() {
        let dir = std::env::temp_dir().join(format!("feapack_odb_test_{}", std::process::id()));
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("roundtrip.out");
        let _ = fs::remove_file(&path);

        let mesh = sample_mesh();
        {
            let mut odb = Odb::new(&path, OdbMode::Write, true).unwrap();
            odb.write_next_frame(
                "static analysis, frame 0",
                &mesh,
                &[("Displacement Magnitude".to_string(), vec![0.0, 0.1, 0.2, 0.3])],
                &[("Strain Energy".to_string(), 1.5)],
            )
            .unwrap();
        }

        let odb = Odb::new(&path, OdbMode::Read, false).unwrap();
        assert_eq!(odb.frame_count(), 1);
        assert_eq!(odb.description(), "static analysis, frame 0");
        assert_eq!(odb.nodes().len(), 4);
        assert_eq!(odb.elements().unwrap().len(), 1);
        assert_eq!(odb.node_output_titles(), vec!["Displacement Magnitude"]);
        let values = odb.node_output_values("Displacement Magnitude").unwrap();
        assert_eq!(values, vec![0.0, 0.1, 0.2, 0.3]);
        assert_eq!(odb.global_output_values("Strain Energy").unwrap(), 1.5);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_in_read_mode_errors() {
        let path = std::env::temp_dir().join("feapack_odb_does_not_exist.out");
        let _ = fs::remove_file(&path);
        assert!(Odb::new(&path, OdbMode::Read, false).is_err());
    }

    fn write_raw(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("feapack_odb_test_{}", std::process::id()));
        let _ = fs::create_dir_all(&dir);
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_end_frame_errors() {
        let path = write_raw(
            "malformed_no_end_frame.out",
            "$FRAME\n0\n\n$DESCRIPTION\nframe 0\n\n$NODES 0\n\n",
        );
        match Odb::new(&path, OdbMode::Read, false) {
            Err(Error::MalformedOdb(_)) => {}
            other => panic!("expected Error::MalformedOdb, got {other:?}"),
        }
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn extra_whitespace_is_tolerated() {
        let path = write_raw(
            "well_formed_extra_whitespace.out",
            "$FRAME  \n0\n\n$DESCRIPTION\nframe 0\n\n$NODES 1\n1.0, 0.0, 0.0\n\n$ELEMENTS 0\n\n$NODE_OUTPUT_TITLES 0\n\n$NODE_OUTPUT_VALUES 0\n\n$GLOBAL_OUTPUT_TITLES 0\n\n$GLOBAL_OUTPUT_VALUES 0\n\n$END_FRAME  \n\n",
        );
        let odb = Odb::new(&path, OdbMode::Read, false).unwrap();
        assert_eq!(odb.frame_count(), 1);
        assert_eq!(odb.nodes().len(), 1);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn negative_count_errors() {
        let path = write_raw(
            "malformed_negative_count.out",
            "$FRAME\n0\n\n$DESCRIPTION\nframe 0\n\n$NODES -5\n\n$END_FRAME\n\n",
        );
        match Odb::new(&path, OdbMode::Read, false) {
            Err(Error::MalformedOdb(_)) => {}
            other => panic!("expected Error::MalformedOdb, got {other:?}"),
        }
        let _ = fs::remove_file(&path);
    }
}
