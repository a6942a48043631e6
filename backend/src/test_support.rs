//! Shared fixtures for unit tests.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::models::Record;
use crate::xml::charset;

/// Two claims: the first with two procedures and a personal tax id, the
/// second with no procedures and a corporate tax id.
pub const SAMPLE_XTE: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<ans:mensagemTISS xmlns:ans="http://www.ans.gov.br/padroes/tiss/schemas" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <ans:cabecalho>
    <ans:identificacaoTransacao>
      <ans:tipoTransacao>MONITORAMENTO_SAUDE_SUPLEMENTAR</ans:tipoTransacao>
      <ans:numeroLote>2025030101</ans:numeroLote>
      <ans:competenciaLote>202503</ans:competenciaLote>
      <ans:dataRegistroTransacao>2025-04-02</ans:dataRegistroTransacao>
      <ans:horaRegistroTransacao>09:15:00</ans:horaRegistroTransacao>
    </ans:identificacaoTransacao>
    <ans:registroANS>123456</ans:registroANS>
    <ans:versaoPadrao>5.01.00</ans:versaoPadrao>
  </ans:cabecalho>
  <ans:mensagem>
    <ans:operadoraParaANS>
      <ans:monitoramentoSaudeSuplementar>
        <ans:identificacaoMonitorado>
          <ans:registroANS>123456</ans:registroANS>
          <ans:cnpjOperadora>11222333000144</ans:cnpjOperadora>
          <ans:dataEmissao>2025-04-01</ans:dataEmissao>
        </ans:identificacaoMonitorado>
        <ans:dadosBeneficiario>
          <ans:numeroCarteira>0001234500</ans:numeroCarteira>
          <ans:tempoPlano>24</ans:tempoPlano>
          <ans:nomeBeneficiario>  Maria da Conceição  </ans:nomeBeneficiario>
          <ans:dataNascimento>1980-05-20</ans:dataNascimento>
          <ans:sexo>3</ans:sexo>
          <ans:codigoMunicipio>3550308</ans:codigoMunicipio>
          <ans:numeroContrato>C-77</ans:numeroContrato>
          <ans:tipoPlano>1</ans:tipoPlano>
        </ans:dadosBeneficiario>
        <ans:dadosContratado>
          <ans:identificacao>
            <ans:codigoNaOperadora>PREST01</ans:codigoNaOperadora>
            <ans:cpf>12345678901</ans:cpf>
          </ans:identificacao>
          <ans:nomeContratado>Clínica São Lucas</ans:nomeContratado>
        </ans:dadosContratado>
        <ans:eventosAtencaoSaude>
          <ans:numeroGuiaPrestador>G-1001</ans:numeroGuiaPrestador>
          <ans:numeroGuiaOperadora>OP-9001</ans:numeroGuiaOperadora>
          <ans:senha>S123</ans:senha>
          <ans:tipoAtendimento>04</ans:tipoAtendimento>
          <ans:indicadorRecemNascido>N</ans:indicadorRecemNascido>
          <ans:indicadorAcidente>9</ans:indicadorAcidente>
          <ans:dataRealizacao>2025-03-10</ans:dataRealizacao>
          <ans:caraterAtendimento>1</ans:caraterAtendimento>
          <ans:cboProfissional>225125</ans:cboProfissional>
          <ans:procedimentosRealizados>
            <ans:codigoTabela>22</ans:codigoTabela>
            <ans:codigoProcedimento>10101012</ans:codigoProcedimento>
            <ans:descricaoProcedimento>Consulta em consultório</ans:descricaoProcedimento>
            <ans:quantidadeExecutada>1</ans:quantidadeExecutada>
            <ans:valorInformado>150.00</ans:valorInformado>
            <ans:valorProcessado>150.00</ans:valorProcessado>
            <ans:valorLiberado>120.00</ans:valorLiberado>
            <ans:valorGlosa>30.00</ans:valorGlosa>
          </ans:procedimentosRealizados>
          <ans:procedimentosRealizados>
            <ans:codigoTabela>22</ans:codigoTabela>
            <ans:codigoProcedimento>40301630</ans:codigoProcedimento>
            <ans:descricaoProcedimento>Hemograma completo</ans:descricaoProcedimento>
            <ans:quantidadeExecutada>1</ans:quantidadeExecutada>
            <ans:valorInformado>25.50</ans:valorInformado>
            <ans:valorProcessado>25.50</ans:valorProcessado>
            <ans:valorLiberado>25.50</ans:valorLiberado>
            <ans:valorGlosa>0.00</ans:valorGlosa>
          </ans:procedimentosRealizados>
        </ans:eventosAtencaoSaude>
        <ans:totaisGuia>
          <ans:valorTotalInformado>175.50</ans:valorTotalInformado>
          <ans:valorTotalProcessado>175.50</ans:valorTotalProcessado>
          <ans:valorTotalLiberado>145.50</ans:valorTotalLiberado>
          <ans:valorTotalGlosa>30.00</ans:valorTotalGlosa>
        </ans:totaisGuia>
      </ans:monitoramentoSaudeSuplementar>
      <ans:monitoramentoSaudeSuplementar>
        <ans:identificacaoMonitorado>
          <ans:registroANS>123456</ans:registroANS>
          <ans:cnpjOperadora>11222333000144</ans:cnpjOperadora>
          <ans:dataEmissao>2025-04-01</ans:dataEmissao>
        </ans:identificacaoMonitorado>
        <ans:dadosBeneficiario>
          <ans:numeroCarteira>0009876500</ans:numeroCarteira>
          <ans:nomeBeneficiario>José Souza</ans:nomeBeneficiario>
          <ans:dataNascimento>2019-01-15</ans:dataNascimento>
          <ans:sexo>1</ans:sexo>
        </ans:dadosBeneficiario>
        <ans:dadosContratado>
          <ans:identificacao>
            <ans:cnpj>44555666000177</ans:cnpj>
          </ans:identificacao>
          <ans:nomeContratado>Hospital Central</ans:nomeContratado>
        </ans:dadosContratado>
        <ans:eventosAtencaoSaude>
          <ans:numeroGuiaPrestador>G-1002</ans:numeroGuiaPrestador>
          <ans:tipoAtendimento>05</ans:tipoAtendimento>
          <ans:dataRealizacao>2025-03-12</ans:dataRealizacao>
        </ans:eventosAtencaoSaude>
        <ans:totaisGuia>
          <ans:valorTotalInformado>0.00</ans:valorTotalInformado>
          <ans:valorTotalProcessado>0.00</ans:valorTotalProcessado>
          <ans:valorTotalLiberado>0.00</ans:valorTotalLiberado>
          <ans:valorTotalGlosa>0.00</ans:valorTotalGlosa>
        </ans:totaisGuia>
      </ans:monitoramentoSaudeSuplementar>
    </ans:operadoraParaANS>
  </ans:mensagem>
  <ans:epilogo>
    <ans:hash>00000000000000000000000000000000</ans:hash>
  </ans:epilogo>
</ans:mensagemTISS>
"#;

/// [`SAMPLE_XTE`] as Latin-1 bytes, the way it arrives from disk.
pub fn sample_bytes() -> Vec<u8> {
    charset::encode(SAMPLE_XTE)
}

/// Fixed clock for deterministic encoder output.
pub fn fixed_now() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2025-04-10T14:07:09-03:00").unwrap()
}

/// Build a record from `(column, value)` pairs; other columns are absent.
pub fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}
