use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    line.get(start..end).unwrap_or("").trim()
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

/// PDB file format support.
///
/// Reads `ATOM`/`HETATM` records with fixed-column parsing and writes them
/// back out with a `TER` card after every residue. Host-guest systems treat
/// each residue as a separate molecule, which matches how tleap expects the
/// input to be chunked.
pub struct PdbFile;

impl StructureFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut structure = Structure::new();
        let mut current_residue = None;
        let mut current_residue_key: Option<(isize, String)> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            let record_type = slice_and_trim(&line, 0, 6);
            match record_type {
                "ATOM" | "HETATM" => {
                    let serial_str = slice_and_trim(&line, 6, 11);
                    let name_str = slice_and_trim(&line, 12, 16);
                    let res_name_str = slice_and_trim(&line, 17, 20);
                    let res_seq_str = slice_and_trim(&line, 22, 26);

                    if name_str.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    let serial: usize = serial_str.parse().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "7-11".into(),
                            value: serial_str.into(),
                        },
                    })?;
                    let res_seq: isize = res_seq_str.parse().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "23-26".into(),
                            value: res_seq_str.into(),
                        },
                    })?;
                    let x = parse_float(&line, line_num, 30, 38)?;
                    let y = parse_float(&line, line_num, 38, 46)?;
                    let z = parse_float(&line, line_num, 46, 54)?;

                    // Occupancy, B-factor, and element are optional in
                    // practice; plenty of generated files stop at column 54.
                    let occupancy = slice_and_trim(&line, 54, 60).parse().unwrap_or(0.0);
                    let b_factor = slice_and_trim(&line, 60, 66).parse().unwrap_or(0.0);
                    let element = slice_and_trim(&line, 76, 78).to_string();

                    let key = (res_seq, res_name_str.to_string());
                    if current_residue_key.as_ref() != Some(&key) {
                        current_residue = Some(structure.add_residue(res_seq, res_name_str));
                        current_residue_key = Some(key);
                    }
                    let residue_id = current_residue.unwrap();
                    let mut atom = Atom::new(name_str, serial, residue_id, Point3::new(x, y, z));
                    atom.occupancy = occupancy;
                    atom.b_factor = b_factor;
                    atom.element = element;
                    structure.add_atom_to_residue(residue_id, atom);
                }
                // TER closes the current residue run so a following residue
                // with the same number starts fresh.
                "TER" => {
                    current_residue = None;
                    current_residue_key = None;
                }
                "END" | "ENDMDL" => break,
                _ => continue,
            }
        }

        if structure.is_empty() {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }
        Ok(structure)
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        for (_, residue) in structure.residues_iter() {
            let record_type = if residue.name.starts_with("DM") {
                "HETATM"
            } else {
                "ATOM"
            };
            let mut last_serial = 0;
            for &atom_id in residue.atoms() {
                let atom = structure.atom(atom_id).expect("residue references live atom");
                // Names shorter than four characters start one column in,
                // unless the element symbol is two characters wide.
                let name = if atom.name.len() < 4 && atom.element.len() != 2 {
                    format!(" {:<3}", atom.name)
                } else {
                    format!("{:<4}", atom.name)
                };
                writeln!(
                    writer,
                    "{:<6}{:>5} {:<4}{:1}{:<3} {:1}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                    record_type,
                    atom.serial,
                    name,
                    "",
                    residue.name,
                    "",
                    residue.number,
                    atom.position.x,
                    atom.position.y,
                    atom.position.z,
                    atom.occupancy,
                    atom.b_factor,
                    atom.element,
                )?;
                last_serial = atom.serial;
            }
            writeln!(
                writer,
                "{:<6}{:>5}      {:<3}{:>6}",
                "TER",
                last_serial + 1,
                residue.name,
                residue.number
            )?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}
