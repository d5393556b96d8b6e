
use anyhow::{anyhow, bail, Context};
use log::trace;
use noodles::bam;
use noodles::core::Region;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::data::field::{Tag, Value};

use crate::data_types::evidence::{BreakpointLocation, EvidenceByContig, EvidenceRecord, SampleLabel};
use crate::data_types::orientation::{BreakendSide, OrientationClass};
use crate::data_types::work_unit::WorkUnit;
use crate::engine::EvidenceExtractor;
use crate::parsing::alignments::find_bam_index;
use crate::parsing::contigs::ContigAllowList;
use crate::pipeline::config::RunConfig;

/// Default extractor: CIGAR indels and split alignments (SA tag) from indexed BAM files
#[derive(Clone, Copy, Debug, Default)]
pub struct AlignmentEvidenceExtractor;

impl EvidenceExtractor for AlignmentEvidenceExtractor {
    fn extract_evidence(&self, unit: &WorkUnit) -> anyhow::Result<EvidenceByContig> {
        let bam_fn = unit.source();
        let index_fn = find_bam_index(bam_fn)?;
        let index = bam::bai::fs::read(&index_fn)
            .with_context(|| format!("Error while reading index {index_fn:?}:"))?;
        let mut reader = bam::io::indexed_reader::Builder::default()
            .set_index(index)
            .build_from_path(bam_fn)
            .with_context(|| format!("Error while opening {bam_fn:?}:"))?;
        let header = reader.read_header()
            .with_context(|| format!("Error while reading header of {bam_fn:?}:"))?;

        let region = match unit.interval() {
            Some(interval) => interval.to_region()?,
            None => Region::new(unit.contig(), ..)
        };

        let mut evidence = EvidenceByContig::default();
        let query = reader.query(&header, &region)
            .with_context(|| format!("Error while querying {region} in {bam_fn:?}:"))?;
        for result in query {
            let record = result
                .with_context(|| format!("Error while reading record in {region} of {bam_fn:?}:"))?;
            let Some(alignment) = ParsedAlignment::from_bam_record(&record, unit.contig(), unit.config())? else {
                continue;
            };

            // reads are only counted by the unit that holds their start, so chunks never double count
            if let Some(interval) = unit.interval() {
                if !interval.contains(alignment.start) {
                    continue;
                }
            }

            for e in alignment.into_evidence(unit.sample(), unit.allowlist(), unit.config()) {
                evidence.entry(e.contig().to_string()).or_default().push(e);
            }
        }

        trace!("{}: {} contigs with evidence", unit.description(), evidence.len());
        Ok(evidence)
    }
}

/// Reference span and clipping summary of a CIGAR
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct CigarSummary {
    /// Bases of reference covered
    ref_span: u64,
    /// Clipped bases before the first reference-consuming operation
    leading_clip: usize,
    /// Clipped bases after the last reference-consuming operation
    trailing_clip: usize,
    /// (0-based reference offset from alignment start, length)
    deletions: Vec<(u64, u64)>,
    /// (0-based reference offset from alignment start, length)
    insertions: Vec<(u64, u64)>
}

impl CigarSummary {
    fn from_ops(ops: impl Iterator<Item = (Kind, usize)>) -> Self {
        let mut summary = Self::default();
        let mut seen_aligned = false;
        for (kind, len) in ops {
            match kind {
                Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch | Kind::Skip => {
                    summary.ref_span += len as u64;
                    seen_aligned = true;
                },
                Kind::Deletion => {
                    summary.deletions.push((summary.ref_span, len as u64));
                    summary.ref_span += len as u64;
                    seen_aligned = true;
                },
                Kind::Insertion => {
                    summary.insertions.push((summary.ref_span, len as u64));
                },
                Kind::SoftClip | Kind::HardClip => {
                    if seen_aligned {
                        summary.trailing_clip += len;
                    } else {
                        summary.leading_clip += len;
                    }
                },
                Kind::Pad => {}
            }
        }
        summary
    }

    /// The breakend implied by the clipping: the larger clip decides which side broke
    fn clipped_breakend(&self, start: u64) -> (u64, BreakendSide) {
        if self.trailing_clip >= self.leading_clip {
            (start + self.ref_span.saturating_sub(1), BreakendSide::Plus)
        } else {
            (start, BreakendSide::Minus)
        }
    }
}

/// Parses a text CIGAR, e.g. from an SA tag
/// # Errors
/// * on unknown operations or missing lengths
fn parse_cigar_string(cigar: &str) -> anyhow::Result<CigarSummary> {
    let mut ops = vec![];
    let mut len_str = String::new();
    for c in cigar.chars() {
        if c.is_ascii_digit() {
            len_str.push(c);
            continue;
        }
        let kind = match c {
            'M' => Kind::Match,
            'I' => Kind::Insertion,
            'D' => Kind::Deletion,
            'N' => Kind::Skip,
            'S' => Kind::SoftClip,
            'H' => Kind::HardClip,
            'P' => Kind::Pad,
            '=' => Kind::SequenceMatch,
            'X' => Kind::SequenceMismatch,
            _ => bail!("Unknown CIGAR operation {c:?} in {cigar:?}")
        };
        let len: usize = len_str.parse()
            .with_context(|| format!("Missing length before {c:?} in {cigar:?}"))?;
        ops.push((kind, len));
        len_str.clear();
    }
    if !len_str.is_empty() {
        bail!("Trailing length without operation in {cigar:?}");
    }
    Ok(CigarSummary::from_ops(ops.into_iter()))
}

/// One entry of an SA tag
#[derive(Clone, Debug, Eq, PartialEq)]
struct SupplementaryAlignment {
    contig: String,
    /// 0-based alignment start
    start: u64,
    mapq: u8,
    cigar: CigarSummary
}

/// Parses `rname,pos,strand,CIGAR,mapQ,NM;` entries
fn parse_other_alignments(sa_tag: &str) -> anyhow::Result<Vec<SupplementaryAlignment>> {
    sa_tag.split(';')
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let fields: Vec<&str> = entry.split(',').collect();
            if fields.len() < 5 {
                bail!("Malformed SA entry: {entry:?}");
            }
            let position: u64 = fields[1].parse()
                .with_context(|| format!("Invalid position in SA entry: {entry:?}"))?;
            let mapq: u8 = fields[4].parse()
                .with_context(|| format!("Invalid MAPQ in SA entry: {entry:?}"))?;
            Ok(SupplementaryAlignment {
                contig: fields[0].to_string(),
                start: position.checked_sub(1).ok_or(anyhow!("SA position must be 1-based: {entry:?}"))?,
                mapq,
                cigar: parse_cigar_string(fields[3])?
            })
        })
        .collect()
}

/// The parts of a passing alignment record that evidence is built from
#[derive(Clone, Debug)]
struct ParsedAlignment {
    read_name: String,
    contig: String,
    /// 0-based alignment start
    start: u64,
    mapq: u8,
    cigar: CigarSummary,
    /// Only filled in for primary alignments
    supplementary: Vec<SupplementaryAlignment>
}

impl ParsedAlignment {
    /// Applies the read filters and parses a BAM record.
    /// Returns `None` for unmapped, secondary, duplicate, QC-fail or low MAPQ records.
    fn from_bam_record(record: &bam::Record, contig: &str, config: &RunConfig) -> anyhow::Result<Option<Self>> {
        let flags = record.flags();
        if flags.is_unmapped() || flags.is_secondary() || flags.is_duplicate() || flags.is_qc_fail() {
            return Ok(None);
        }
        let mapq = match record.mapping_quality().map(u8::from) {
            Some(mq) if mq >= config.min_mapq() => mq,
            _ => return Ok(None)
        };
        let Some(start) = record.alignment_start().transpose()? else {
            return Ok(None);
        };
        let read_name = record.name()
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_default();

        let mut ops = vec![];
        for result in record.cigar().iter() {
            let op = result?;
            ops.push((op.kind(), op.len()));
        }
        let cigar = CigarSummary::from_ops(ops.into_iter());

        let supplementary = if flags.is_supplementary() {
            vec![]
        } else {
            match record.data().get(&Tag::OTHER_ALIGNMENTS) {
                Some(Ok(Value::String(sa_tag))) => parse_other_alignments(&String::from_utf8_lossy(sa_tag))
                    .with_context(|| format!("Error while parsing SA tag for {read_name}:"))?,
                Some(Ok(_)) => bail!("Unexpected SA tag type for {read_name}"),
                Some(Err(e)) => return Err(e).with_context(|| format!("Error while reading SA tag for {read_name}:")),
                None => vec![]
            }
        };

        Ok(Some(Self {
            read_name,
            contig: contig.to_string(),
            start: (usize::from(start) - 1) as u64,
            mapq,
            cigar,
            supplementary
        }))
    }

    /// Converts the alignment into evidence records
    fn into_evidence(self, sample: SampleLabel, allowlist: &ContigAllowList, config: &RunConfig) -> Vec<EvidenceRecord> {
        let mut evidence = vec![];
        let min_length = config.min_length();

        for &(offset, len) in self.cigar.deletions.iter().filter(|(_, len)| *len >= min_length) {
            let del_start = self.start + offset;
            evidence.push(EvidenceRecord::new_breakend(
                self.read_name.clone(), sample, OrientationClass::PlusMinus,
                BreakpointLocation::new(self.contig.clone(), del_start.saturating_sub(1)),
                BreakpointLocation::new(self.contig.clone(), del_start + len),
                self.mapq
            ));
        }

        for &(offset, len) in self.cigar.insertions.iter().filter(|(_, len)| *len >= min_length) {
            evidence.push(EvidenceRecord::new_insertion(
                self.read_name.clone(), sample,
                BreakpointLocation::new(self.contig.clone(), (self.start + offset).saturating_sub(1)),
                len, self.mapq
            ));
        }

        let (primary_pos, primary_side) = self.cigar.clipped_breakend(self.start);
        for supp in self.supplementary.iter() {
            if supp.mapq < config.min_mapq() || !allowlist.contains(&supp.contig) {
                continue;
            }
            let (supp_pos, supp_side) = supp.cigar.clipped_breakend(supp.start);
            if supp.contig == self.contig && supp_pos.abs_diff(primary_pos) < min_length {
                continue;
            }

            let primary = (allowlist.rank(&self.contig), primary_pos);
            let other = (allowlist.rank(&supp.contig), supp_pos);
            let (first, second) = if primary <= other {
                (
                    (BreakpointLocation::new(self.contig.clone(), primary_pos), primary_side),
                    (BreakpointLocation::new(supp.contig.clone(), supp_pos), supp_side)
                )
            } else {
                (
                    (BreakpointLocation::new(supp.contig.clone(), supp_pos), supp_side),
                    (BreakpointLocation::new(self.contig.clone(), primary_pos), primary_side)
                )
            };
            evidence.push(EvidenceRecord::new_breakend(
                self.read_name.clone(), sample, OrientationClass::from_sides(first.1, second.1),
                first.0, second.0, self.mapq
            ));
        }

        evidence
    }
}
