//! Field map for the TISS 5.01.00 monitoring message.
//!
//! One ordered table of `(element path, column name)` pairs per level of the
//! document, shared by the decoder and the encoder. Paths are `/`-separated
//! local element names relative to the owning node:
//!
//! | Level     | Relative to                          |
//! |-----------|--------------------------------------|
//! | header    | `cabecalho`                          |
//! | claim     | `monitoramentoSaudeSuplementar`      |
//! | procedure | `procedimentosRealizados`            |
//!
//! Entries are listed in schema sequence order; the encoder emits elements in
//! exactly this order. Fields not listed here are not round-tripped.

/// TISS standard version written into every generated header.
pub const TISS_VERSION: &str = "5.01.00";

/// Namespace of every TISS element.
pub const TISS_NAMESPACE: &str = "http://www.ans.gov.br/padroes/tiss/schemas";

/// Prefix bound to [`TISS_NAMESPACE`] in generated documents.
pub const TISS_PREFIX: &str = "ans";

/// Schema file for the monitoring message of [`TISS_VERSION`].
pub const TISS_SCHEMA_FILE: &str = "tissMonitoramentoV5_01_00.xsd";

/// Transaction type of the monitoring message.
pub const TRANSACTION_TYPE: &str = "MONITORAMENTO_SAUDE_SUPLEMENTAR";

/// XML Schema instance namespace.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML Schema namespace.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Column holding the originating file name.
pub const ORIGIN_COLUMN: &str = "Nome da Origem";

/// Computed age-at-service column.
pub const AGE_COLUMN: &str = "Idade_na_Realizacao";

// Element names of the fixed document skeleton.
pub const ROOT_ELEMENT: &str = "mensagemTISS";
pub const HEADER_ELEMENT: &str = "cabecalho";
pub const BODY_ELEMENT: &str = "mensagem";
pub const OPERATOR_ELEMENT: &str = "operadoraParaANS";
pub const CLAIM_ELEMENT: &str = "monitoramentoSaudeSuplementar";
pub const EVENTS_ELEMENT: &str = "eventosAtencaoSaude";
pub const PROCEDURE_ELEMENT: &str = "procedimentosRealizados";
pub const EPILOGUE_ELEMENT: &str = "epilogo";
pub const HASH_ELEMENT: &str = "hash";

/// How a field's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Opaque text (monetary values included).
    Text,
    /// `YYYY-MM-DD` in XML, `DD/MM/YYYY` in the table.
    Date,
}

/// One mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// `/`-separated element path relative to the owning node.
    pub path: &'static str,
    /// Flat column name.
    pub column: &'static str,
    pub kind: FieldKind,
}

impl Field {
    const fn text(path: &'static str, column: &'static str) -> Self {
        Self { path, column, kind: FieldKind::Text }
    }

    const fn date(path: &'static str, column: &'static str) -> Self {
        Self { path, column, kind: FieldKind::Date }
    }

    /// Path split into element names.
    pub fn segments(&self) -> impl Iterator<Item = &'static str> {
        self.path.split('/')
    }

    /// Last path segment, the element that holds the value.
    pub fn element(&self) -> &'static str {
        self.path.rsplit('/').next().unwrap_or(self.path)
    }
}

/// Header fields, relative to `cabecalho`.
pub static HEADER_FIELDS: [Field; 7] = [
    Field::text("identificacaoTransacao/tipoTransacao", "tipoTransacao"),
    Field::text("identificacaoTransacao/numeroLote", "numeroLote"),
    Field::text("identificacaoTransacao/competenciaLote", "competenciaLote"),
    Field::date("identificacaoTransacao/dataRegistroTransacao", "dataRegistroTransacao"),
    Field::text("identificacaoTransacao/horaRegistroTransacao", "horaRegistroTransacao"),
    Field::text("registroANS", "registroANS_cabecalho"),
    Field::text("versaoPadrao", "versaoPadrao_cabecalho"),
];

/// Claim fields, relative to `monitoramentoSaudeSuplementar`.
///
/// Procedures are nested inside `eventosAtencaoSaude`, after its last field
/// here and before `totaisGuia`.
pub static CLAIM_FIELDS: [Field; 28] = [
    Field::text("identificacaoMonitorado/registroANS", "registroANS_monitorado"),
    Field::text("identificacaoMonitorado/cnpjOperadora", "cnpjOperadora"),
    Field::date("identificacaoMonitorado/dataEmissao", "dataEmissao"),
    Field::text("dadosBeneficiario/numeroCarteira", "numeroCarteira"),
    Field::text("dadosBeneficiario/tempoPlano", "tempoPlano"),
    Field::text("dadosBeneficiario/nomeBeneficiario", "nomeBeneficiario"),
    Field::date("dadosBeneficiario/dataNascimento", "dataNascimento"),
    Field::text("dadosBeneficiario/sexo", "sexo"),
    Field::text("dadosBeneficiario/codigoMunicipio", "codigoMunicipioBeneficiario"),
    Field::text("dadosBeneficiario/numeroContrato", "numeroContrato"),
    Field::text("dadosBeneficiario/tipoPlano", "tipoPlano"),
    Field::text("dadosContratado/identificacao/codigoNaOperadora", "codigoContratadoNaOperadora"),
    Field::text("dadosContratado/identificacao/cpf", CPF_COLUMN),
    Field::text("dadosContratado/identificacao/cnpj", CNPJ_COLUMN),
    Field::text("dadosContratado/nomeContratado", "nomeContratado"),
    Field::text("eventosAtencaoSaude/numeroGuiaPrestador", GUIDE_COLUMN),
    Field::text("eventosAtencaoSaude/numeroGuiaOperadora", "numeroGuiaOperadora"),
    Field::text("eventosAtencaoSaude/senha", "senha"),
    Field::text("eventosAtencaoSaude/tipoAtendimento", "tipoAtendimento"),
    Field::text("eventosAtencaoSaude/indicadorRecemNascido", "indicadorRecemNascido"),
    Field::text("eventosAtencaoSaude/indicadorAcidente", "indicadorAcidente"),
    Field::date("eventosAtencaoSaude/dataRealizacao", SERVICE_DATE_COLUMN),
    Field::text("eventosAtencaoSaude/caraterAtendimento", "caraterAtendimento"),
    Field::text("eventosAtencaoSaude/cboProfissional", "cboProfissional"),
    Field::text("totaisGuia/valorTotalInformado", "valorTotalInformado"),
    Field::text("totaisGuia/valorTotalProcessado", "valorTotalProcessado"),
    Field::text("totaisGuia/valorTotalLiberado", "valorTotalLiberado"),
    Field::text("totaisGuia/valorTotalGlosa", "valorTotalGlosa"),
];

/// Procedure fields, relative to `procedimentosRealizados`.
pub static PROCEDURE_FIELDS: [Field; 8] = [
    Field::text("codigoTabela", "codigoTabela"),
    Field::text("codigoProcedimento", PROCEDURE_CODE_COLUMN),
    Field::text("descricaoProcedimento", "descricaoProcedimento"),
    Field::text("quantidadeExecutada", "quantidadeExecutada"),
    Field::text("valorInformado", "valorInformado"),
    Field::text("valorProcessado", "valorProcessado"),
    Field::text("valorLiberado", "valorLiberado"),
    Field::text("valorGlosa", "valorGlosa"),
];

// Columns the encoder and the age calculation address directly.
pub const COMPETENCY_COLUMN: &str = "competenciaLote";
pub const HEADER_REGISTRY_COLUMN: &str = "registroANS_cabecalho";
pub const ISSUE_DATE_COLUMN: &str = "dataEmissao";
pub const BIRTH_DATE_COLUMN: &str = "dataNascimento";
pub const SERVICE_DATE_COLUMN: &str = "dataRealizacao";
pub const CPF_COLUMN: &str = "cpfContratado";
pub const CNPJ_COLUMN: &str = "cnpjContratado";
pub const GUIDE_COLUMN: &str = "numeroGuia_prestador";
pub const PROCEDURE_CODE_COLUMN: &str = "codigoProcedimento";

/// Final table column order: origin, header, claim, procedure, age.
pub static COLUMNS: [&str; 45] = [
    ORIGIN_COLUMN,
    "tipoTransacao",
    "numeroLote",
    "competenciaLote",
    "dataRegistroTransacao",
    "horaRegistroTransacao",
    "registroANS_cabecalho",
    "versaoPadrao_cabecalho",
    "registroANS_monitorado",
    "cnpjOperadora",
    "dataEmissao",
    "numeroCarteira",
    "tempoPlano",
    "nomeBeneficiario",
    "dataNascimento",
    "sexo",
    "codigoMunicipioBeneficiario",
    "numeroContrato",
    "tipoPlano",
    "codigoContratadoNaOperadora",
    "cpfContratado",
    "cnpjContratado",
    "nomeContratado",
    "numeroGuia_prestador",
    "numeroGuiaOperadora",
    "senha",
    "tipoAtendimento",
    "indicadorRecemNascido",
    "indicadorAcidente",
    "dataRealizacao",
    "caraterAtendimento",
    "cboProfissional",
    "valorTotalInformado",
    "valorTotalProcessado",
    "valorTotalLiberado",
    "valorTotalGlosa",
    "codigoTabela",
    "codigoProcedimento",
    "descricaoProcedimento",
    "quantidadeExecutada",
    "valorInformado",
    "valorProcessado",
    "valorLiberado",
    "valorGlosa",
    AGE_COLUMN,
];

/// `xsi:schemaLocation` value for generated documents.
pub fn schema_location() -> String {
    format!("{TISS_NAMESPACE} {TISS_NAMESPACE}/{TISS_SCHEMA_FILE}")
}

/// All mapped fields, header first.
pub fn all_fields() -> impl Iterator<Item = &'static Field> {
    HEADER_FIELDS
        .iter()
        .chain(CLAIM_FIELDS.iter())
        .chain(PROCEDURE_FIELDS.iter())
}

/// Column name for a claim-relative element path.
pub fn column_for_path(path: &str) -> Option<&'static str> {
    CLAIM_FIELDS
        .iter()
        .find(|f| f.path == path)
        .map(|f| f.column)
}

/// Field definition for a column name.
pub fn field_for_column(column: &str) -> Option<&'static Field> {
    all_fields().find(|f| f.column == column)
}

/// Whether the decoder normalizes this column as a date.
///
/// Any column whose name contains `data`, ignoring case.
pub fn is_date_column(column: &str) -> bool {
    column.to_lowercase().contains("data")
}
