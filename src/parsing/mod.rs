/*!
# Parsing module
Contains the logic for parsing input files into meaningful structs / data.
*/
/// Indexed alignment inputs and their contig statistics
pub mod alignments;
/// FASTA index contigs and the contig allow-list
pub mod contigs;
/// Random access to reference bases
pub mod reference;
