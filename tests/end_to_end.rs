use ckw::cl::helpers::{decompose_vector_width, SUPPORTED_VECTOR_WIDTHS};
use ckw::{
    create_kernel_writer, BinaryOp, ComponentArgument, ConstantData, DataType, Kernel,
    KernelWriter, ScopedKernelWriter, TargetLanguage, TensorDataLayout, TensorInfo, TensorSampler,
    TensorSamplerAddressMode, TileInfo, TileOperand, UnaryOp, VariableTable, WriterConfig,
};
use proptest::prelude::*;

fn bare_config() -> WriterConfig {
    WriterConfig::default().with_emit_extensions(false)
}

fn tensor(id: i32) -> TensorInfo {
    TensorInfo::new(DataType::Fp32, [3, 10, 20, 1, 1], TensorDataLayout::Nhwc, id)
}

fn int_const(w: &mut dyn KernelWriter, value: i32) -> TileOperand {
    w.declare_constant_tile(&ConstantData::scalar(value, DataType::Int32).unwrap())
        .unwrap()
}

/// src0 + src1, exp, store; one 4x4 block per work item.
fn golden_kernel(config: WriterConfig) -> Kernel {
    let mut w = create_kernel_writer(TargetLanguage::OpenCL, config);
    let src0 = w.declare_tensor_argument("src0", tensor(0)).unwrap();
    let src1 = w.declare_tensor_argument("src1", tensor(1)).unwrap();
    let dst = w.declare_tensor_argument("dst", tensor(2)).unwrap();

    let zero = int_const(w.as_mut(), 0);
    let four = int_const(w.as_mut(), 4);
    let scalar = TileInfo::scalar(DataType::Int32);
    let gid_x = w.declare_tile("gid_x", scalar).unwrap();
    let gid_y = w.declare_tile("gid_y", scalar).unwrap();
    let x = w.declare_tile("x", scalar).unwrap();
    let y = w.declare_tile("y", scalar).unwrap();
    let a = w.declare_tile("a", TileInfo::new(DataType::Fp32, 4, 4)).unwrap();
    let b = w.declare_tile("b", TileInfo::new(DataType::Fp32, 4, 4)).unwrap();

    w.op_get_global_id(&gid_x, 0).unwrap();
    w.op_get_global_id(&gid_y, 1).unwrap();
    w.op_binary(&x, BinaryOp::Mul, &gid_x, &four).unwrap();
    w.op_binary(&y, BinaryOp::Mul, &gid_y, &four).unwrap();

    let sampler =
        TensorSampler::default().with_address_mode_y(TensorSamplerAddressMode::ClampToBorder);
    w.op_load(&a, &src0, &sampler, &x, &y, &zero, &zero).unwrap();
    w.op_load(&b, &src1, &sampler, &x, &y, &zero, &zero).unwrap();
    w.op_binary(&a, BinaryOp::Add, &a, &b).unwrap();
    w.op_unary(&a, UnaryOp::Exp, &a).unwrap();
    w.op_store(&dst, &a, &sampler, &x, &y, &zero, &zero).unwrap();

    w.emit_kernel("add_exp").unwrap()
}

fn address(tensor: &str, row: i32) -> String {
    format!(
        "(__global float*)(G0__{t}_ptr + (G0__x) * sizeof(float) + (G0__y + {r}) * G0__{t}_stride1)",
        t = tensor,
        r = row
    )
}

fn guard(tensor: &str, row: i32) -> String {
    format!(
        "if((G0__y + {r} >= 0) && (G0__y + {r} < G0__{t}_dim1xdim2))\n{{\n",
        t = tensor,
        r = row
    )
}

fn expected_golden() -> String {
    let mut s = String::from("__kernel void add_exp\n(\n");
    for t in ["src0", "src1", "dst"] {
        s += &format!(
            "__global uchar* G0__{t}_ptr,\nint G0__{t}_dim1xdim2,\nint G0__{t}_stride1,\n",
            t = t
        );
    }
    s.truncate(s.len() - 2);
    s += "\n)\n{\n";

    s += "int G0__gid_x;\nint G0__gid_y;\nint G0__x;\nint G0__y;\n";
    for tile in ["a", "b"] {
        for r in 0..4 {
            s += &format!("float4 G0__{}__{};\n", tile, r);
        }
    }
    s += "G0__gid_x = get_global_id(0);\nG0__gid_y = get_global_id(1);\n";
    s += "G0__x = G0__gid_x * ((int)(4));\nG0__y = G0__gid_y * ((int)(4));\n";

    for (tile, tensor) in [("a", "src0"), ("b", "src1")] {
        for r in 0..4 {
            s += &guard(tensor, r);
            s += &format!("G0__{}__{} = vload4(0, {});\n", tile, r, address(tensor, r));
            s += &format!("}}\nelse\n{{\nG0__{}__{} = 0;\n}}\n", tile, r);
        }
    }
    for r in 0..4 {
        s += &format!("G0__a__{r} = G0__a__{r} + G0__b__{r};\n", r = r);
    }
    for r in 0..4 {
        s += &format!("G0__a__{r} = exp(G0__a__{r});\n", r = r);
    }
    for r in 0..4 {
        s += &guard("dst", r);
        s += &format!("vstore4(G0__a__{}, 0, {});\n", r, address("dst", r));
        s += "}\n";
    }
    s += "}\n";
    s
}

// ── golden ──

#[test]
fn test_golden_add_exp_store() {
    let kernel = golden_kernel(bare_config());
    assert_eq!(kernel.source_code(), expected_golden());
}

#[test]
fn test_golden_arguments() {
    let kernel = golden_kernel(bare_config());
    insta::assert_snapshot!(
        format!("{:?}", kernel.arguments()),
        @"[TensorStorage { id: 0, storage: BufferUint8Ptr }, TensorComponent { id: 0, component: Dim1xDim2 }, TensorComponent { id: 0, component: Stride1 }, TensorStorage { id: 1, storage: BufferUint8Ptr }, TensorComponent { id: 1, component: Dim1xDim2 }, TensorComponent { id: 1, component: Stride1 }, TensorStorage { id: 2, storage: BufferUint8Ptr }, TensorComponent { id: 2, component: Dim1xDim2 }, TensorComponent { id: 2, component: Stride1 }]"
    );
}

#[test]
fn test_golden_with_extensions_and_by_value() {
    let kernel = golden_kernel(WriterConfig::default().with_return_dims_by_value(true));
    let src = kernel.source_code();
    assert!(src.starts_with("\n#if defined(cl_khr_fp16)\n"));
    // Dim1 x Dim2 folds to 10 * 20; strides stay parameters.
    assert!(src.contains("(G0__y + 3 < 200)"));
    assert!(!src.contains("dim1xdim2"));
    assert!(src.contains("int G0__dst_stride1\n)\n{\n"));
    assert_eq!(kernel.arguments().len(), 6);
}

#[test]
fn test_golden_is_deterministic() {
    let a = golden_kernel(bare_config());
    let b = golden_kernel(bare_config());
    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());
}

// ── fused components ──

/// Two components sharing src through a variable table, the second one
/// consuming the first one's result as a virtual tensor.
#[test]
fn test_fused_components_share_tensors() {
    let mut w = create_kernel_writer(TargetLanguage::OpenCL, bare_config());
    let mut vars = VariableTable::new();
    let sampler = TensorSampler::default();
    let zero = int_const(w.as_mut(), 0);

    {
        let mut c = ScopedKernelWriter::new(w.as_mut());
        let src = vars.declare_variable(&mut *c, tensor(0), "src").unwrap().tensor().unwrap();
        let t = c.declare_tile("t", TileInfo::new(DataType::Fp32, 1, 4)).unwrap();
        c.op_load(&t, &src, &sampler, &zero, &zero, &zero, &zero).unwrap();
        vars.declare_variable(&mut *c, tensor(-1), "tmp")
            .unwrap()
            .init_virtual_tensor(t, sampler)
            .unwrap();
    }
    {
        let mut c = ScopedKernelWriter::new(w.as_mut());
        let src: ComponentArgument = *vars.declare_variable(&mut *c, tensor(0), "ignored").unwrap();
        let tmp = *vars.declare_variable(&mut *c, tensor(-1), "tmp").unwrap();
        let dst = vars.declare_variable(&mut *c, tensor(2), "dst").unwrap().tensor().unwrap();
        let t = c.declare_tile("t", TileInfo::new(DataType::Fp32, 1, 4)).unwrap();
        c.op_load(&t, &src.tensor().unwrap(), &sampler, &zero, &zero, &zero, &zero)
            .unwrap();
        c.op_binary(&t, BinaryOp::Max, &t, &tmp.tile().unwrap()).unwrap();
        c.op_store(&dst, &t, &sampler, &zero, &zero, &zero, &zero).unwrap();
    }
    assert_eq!(w.id_space(), 0);
    assert_eq!(vars.len(), 3);

    let kernel = w.emit_kernel("fused").unwrap();
    let src = kernel.source_code();
    assert!(src.contains("float4 G1__t;\n"));
    assert!(src.contains("float4 G2__t;\n"));
    assert!(src.contains("G2__t = fmax(G2__t, G1__t);\n"));
    // Zero x folds away; the row offset is kept.
    assert!(src.contains(
        "G2__t = vload4(0, (__global float*)(G1__src_t0_ptr + (((int)(0)) + 0) * G1__src_t0_stride1));\n"
    ));
    assert!(src.contains(
        "vstore4(G2__t, 0, (__global float*)(G2__dst_t2_ptr + (((int)(0)) + 0) * G2__dst_t2_stride1));\n"
    ));
    assert_eq!(kernel.arguments().len(), 4);
}

// ── decomposition ──

#[test]
fn test_decompose_examples() {
    insta::assert_snapshot!(format!("{:?}", decompose_vector_width(13)), @"[8, 4, 1]");
    insta::assert_snapshot!(format!("{:?}", decompose_vector_width(0)), @"[]");
    insta::assert_snapshot!(format!("{:?}", decompose_vector_width(7)), @"[4, 3]");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_decomposition_sums_to_width(n in 0i32..512) {
        let parts = decompose_vector_width(n);
        prop_assert_eq!(parts.iter().sum::<i32>(), n);
    }

    #[test]
    fn prop_decomposition_is_non_increasing(n in 0i32..512) {
        let parts = decompose_vector_width(n);
        prop_assert!(parts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn prop_decomposition_uses_supported_widths(n in 0i32..512) {
        for part in decompose_vector_width(n) {
            prop_assert!(SUPPORTED_VECTOR_WIDTHS.contains(&part));
        }
    }
}
