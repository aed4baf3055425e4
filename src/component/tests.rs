use super::*;
use crate::cl::CLKernelWriter;
use crate::config::WriterConfig;
use crate::tile::TileInfo;
use crate::types::{DataType, TensorDataLayout};

fn writer() -> CLKernelWriter {
    CLKernelWriter::new(WriterConfig::default())
}

fn tensor(id: i32) -> TensorInfo {
    TensorInfo::new(DataType::Fp32, [4, 4, 1, 1, 1], TensorDataLayout::Nhwc, id)
}

// ── scoped writer ──

#[test]
fn test_scoped_writer_allocates_and_restores_id_space() {
    let mut w = writer();
    {
        let mut scoped = ScopedKernelWriter::new(&mut w);
        assert_eq!(scoped.parent_id_space(), 0);
        assert_eq!(scoped.id_space(), 1);
        scoped.declare_tile("a", TileInfo::scalar(DataType::Fp32)).unwrap();
    }
    assert_eq!(w.id_space(), 0);
    assert_eq!(w.body_source_code(), "float G1__a;\n");
}

#[test]
fn test_sibling_components_do_not_collide() {
    let mut w = writer();
    for _ in 0..2 {
        let mut scoped = ScopedKernelWriter::new(&mut w);
        scoped.declare_tile("acc", TileInfo::scalar(DataType::Int32)).unwrap();
    }
    assert_eq!(w.body_source_code(), "int G1__acc;\nint G2__acc;\n");
}

#[test]
fn test_nested_scope_restores_enclosing_space() {
    let mut w = writer();
    let mut outer = ScopedKernelWriter::new(&mut w);
    {
        let mut inner = outer.nested();
        assert_eq!(inner.parent_id_space(), 1);
        assert_eq!(inner.id_space(), 2);
        inner.declare_tile("t", TileInfo::scalar(DataType::Fp32)).unwrap();
    }
    assert_eq!(outer.id_space(), 1);
    outer.declare_tile("t", TileInfo::scalar(DataType::Fp32)).unwrap();
    assert_eq!(outer.body_source_code(), "float G2__t;\nfloat G1__t;\n");
}

// ── component argument ──

#[test]
fn test_empty_argument_reports_missing_parts() {
    let arg = ComponentArgument::default();
    assert!(!arg.has_tensor());
    assert!(!arg.has_tile());
    assert!(matches!(arg.tensor(), Err(KernelWriterError::Precondition(_))));
    assert!(matches!(arg.tile(), Err(KernelWriterError::Precondition(_))));
    assert!(matches!(arg.tile_sampler(), Err(KernelWriterError::Precondition(_))));
}

#[test]
fn test_init_virtual_tensor() {
    let mut w = writer();
    let tile = w.declare_tile("dst", TileInfo::new(DataType::Fp32, 2, 4)).unwrap();
    let sampler = TensorSampler::default();

    let mut arg = ComponentArgument::default();
    arg.init_virtual_tensor(tile, sampler).unwrap();
    assert!(arg.has_tile());
    assert_eq!(arg.tile().unwrap(), tile);
    assert_eq!(arg.tile_sampler().unwrap(), sampler);

    assert!(arg.init_virtual_tensor(tile, sampler).is_err());
}

// ── variable table ──

#[test]
fn test_declare_variable_names_and_memoizes() {
    let mut w = writer();
    let mut table = VariableTable::new();

    let first = *table.declare_variable(&mut w, tensor(3), "src").unwrap();
    assert!(first.has_tensor());
    let again = *table.declare_variable(&mut w, tensor(3), "other").unwrap();
    assert_eq!(first, again);
    assert_eq!(table.len(), 1);

    let t = first.tensor().unwrap();
    w.tensor_component(&t, crate::types::TensorComponentType::Dim0)
        .unwrap();
    let kernel = w.emit_kernel("k").unwrap();
    assert!(kernel.source_code().contains("int G0__src_t3_dim0\n"));
}

#[test]
fn test_declare_virtual_variable() {
    let mut w = writer();
    let mut table = VariableTable::new();

    let arg = table.declare_variable(&mut w, tensor(-2), "tmp").unwrap();
    assert!(!arg.has_tensor());
    assert!(!arg.has_tile());
    assert!(table.get(-2).is_some());

    let kernel = w.emit_kernel("k").unwrap();
    assert!(kernel.arguments().is_empty());
}

#[test]
fn test_declare_variable_propagates_writer_errors() {
    let mut w = writer();
    w.declare_tensor_argument("src_t5", tensor(9)).unwrap();
    let mut table = VariableTable::new();
    let err = table.declare_variable(&mut w, tensor(5), "src").unwrap_err();
    assert_eq!(err, KernelWriterError::DuplicateTensor("G0__src_t5".to_string()));
    assert!(table.is_empty());
}
