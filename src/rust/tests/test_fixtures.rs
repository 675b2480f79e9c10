pub const TEST_FASTA: &str = "tests/testdata/fasta/allergens.fasta";

pub const TEST_FASTA_CONTENT: &str =
    ">test_protein1\nPLANTANDAAIMALGENQMES\n>test_protein2\nLIVINGALIVE";
pub const TEST_PLAIN_CONTENT: &str = "PLANTANDAAIMALGENQMES\n\nLIVINGALIVE\n";
pub const TEST_PROTEIN: &str = "PLANTANDAAIMALGENQMES";

// Contains invalid character '1' which is not a valid amino acid
pub const TEST_PROTEIN_INVALID: &str = "PLANTANDAAIMALGEN1MES";
