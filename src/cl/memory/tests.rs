use super::*;
use crate::error::KernelWriterError;
use crate::sampler::{TensorSamplerAddressModeX, TensorSamplerFormat};
use crate::tensor::{CLTensorArgument, TensorInfo};
use crate::tile::{CLTile, CLTileEntry, TileInfo};
use crate::types::{DataType, TensorDataLayout};

use crate::sampler::TensorSamplerAddressMode as Mode;

struct Case {
    sampler: TensorSampler,
    op: MemoryOperation,
    tile: TileInfo,
    shape: [i32; 5],
    x: &'static str,
    z: &'static str,
    batch: &'static str,
}

impl Case {
    fn new(sampler: TensorSampler, op: MemoryOperation, tile: TileInfo, shape: [i32; 5]) -> Self {
        Case {
            sampler,
            op,
            tile,
            shape,
            x: "x",
            z: "0",
            batch: "0",
        }
    }

    /// Runs the helper over every tile row with `y + row` coordinates.
    /// Returns the code and the parameter names the tensor ended up with.
    fn run(&self) -> Result<(String, Vec<String>)> {
        let entry = CLTileEntry::Variable(CLTile::new("a", self.tile)?);
        let info = TensorInfo::new(self.tile.data_type, self.shape, TensorDataLayout::Nhwc, 0);
        let mut tensor = CLTensorArgument::new("t", info, false);
        let mut code = String::new();
        {
            let dst = TileView::new(&entry as &dyn VectorTile);
            let ctx = MemoryOpContext::new(&mut code, &mut tensor, self.sampler, self.op, dst);
            let mut helper = create_memory_op_helper(ctx);
            helper.initialize(self.x, self.z, self.batch)?;
            for row in 0..self.tile.height {
                helper.write_row(row, &format!("y + {}", row))?;
            }
            helper.finalize()?;
        }
        let mut params: Vec<String> = tensor.storages().iter().map(|s| s.val.clone()).collect();
        params.extend(tensor.components().iter().map(|c| c.variable().str));
        Ok((code, params))
    }
}

fn buffer(y: Mode) -> TensorSampler {
    TensorSampler::default().with_address_mode_y(y)
}

fn fp32(h: i32, w: i32) -> TileInfo {
    TileInfo::new(DataType::Fp32, h, w)
}

const SHAPE: [i32; 5] = [16, 10, 20, 1, 1];

#[test]
fn test_buffer_load_plain() {
    let (code, params) = Case::new(buffer(Mode::None), MemoryOperation::Load, fp32(1, 4), SHAPE)
        .run()
        .unwrap();
    assert_eq!(
        code,
        "a = vload4(0, (__global float*)(t_ptr + (x) * sizeof(float) + (y + 0) * t_stride1));\n"
    );
    assert_eq!(params, vec!["t_ptr", "t_stride1"]);
}

#[test]
fn test_buffer_scalar_load_and_store() {
    let load = Case::new(buffer(Mode::None), MemoryOperation::Load, fp32(1, 1), SHAPE)
        .run()
        .unwrap()
        .0;
    assert_eq!(
        load,
        "a = *((__global float*)(t_ptr + (x) * sizeof(float) + (y + 0) * t_stride1));\n"
    );
    let store = Case::new(buffer(Mode::None), MemoryOperation::Store, fp32(1, 1), SHAPE)
        .run()
        .unwrap()
        .0;
    assert_eq!(
        store,
        "*((__global float*)(t_ptr + (x) * sizeof(float) + (y + 0) * t_stride1)) = a;\n"
    );
}

#[test]
fn test_buffer_vector_store() {
    let (code, _) = Case::new(buffer(Mode::None), MemoryOperation::Store, fp32(2, 8), SHAPE)
        .run()
        .unwrap();
    assert_eq!(
        code,
        "vstore8(a__0, 0, (__global float*)(t_ptr + (x) * sizeof(float) + (y + 0) * t_stride1));\n\
         vstore8(a__1, 0, (__global float*)(t_ptr + (x) * sizeof(float) + (y + 1) * t_stride1));\n"
    );
}

#[test]
fn test_buffer_address_omits_dead_terms() {
    let mut case = Case::new(
        buffer(Mode::None).with_format(TensorSamplerFormat::Dim0_Dim1_Dim2),
        MemoryOperation::Load,
        fp32(1, 4),
        [16, 10, 1, 3, 1],
    );
    case.x = "((int)(0))";
    case.z = "z";
    case.batch = "b";
    let (code, params) = case.run().unwrap();
    assert_eq!(
        code,
        "a = vload4(0, (__global float*)(t_ptr + (y + 0) * t_stride1 + (b) * t_stride3));\n"
    );
    assert_eq!(params, vec!["t_ptr", "t_stride1", "t_stride3"]);
}

#[test]
fn test_buffer_address_with_all_terms() {
    let mut case = Case::new(
        buffer(Mode::None).with_format(TensorSamplerFormat::Dim0_Dim1_Dim2),
        MemoryOperation::Load,
        TileInfo::new(DataType::Fp16, 1, 2),
        [16, 10, 4, 3, 1],
    );
    case.z = "z";
    case.batch = "b";
    let (code, _) = case.run().unwrap();
    assert_eq!(
        code,
        "a = vload2(0, (__global half*)(t_ptr + (x) * sizeof(half) + (y + 0) * t_stride1 \
         + (z) * t_stride2 + (b) * t_stride3));\n"
    );
}

#[test]
fn test_buffer_y_skip() {
    let (code, params) = Case::new(buffer(Mode::Skip), MemoryOperation::Load, fp32(1, 4), SHAPE)
        .run()
        .unwrap();
    assert_eq!(
        code,
        "if((y + 0 >= 0) && (y + 0 < t_dim1xdim2))\n{\n\
         a = vload4(0, (__global float*)(t_ptr + (x) * sizeof(float) + (y + 0) * t_stride1));\n\
         }\n"
    );
    assert_eq!(params, vec!["t_ptr", "t_dim1xdim2", "t_stride1"]);
}

#[test]
fn test_buffer_y_single_edge_guards() {
    let min = Case::new(buffer(Mode::SkipMinEdgeOnly), MemoryOperation::Load, fp32(1, 4), SHAPE)
        .run()
        .unwrap();
    assert!(min.0.starts_with("if(y + 0 >= 0)\n{\n"));
    assert!(!min.1.contains(&"t_dim1xdim2".to_string()));

    let max = Case::new(buffer(Mode::SkipMaxEdgeOnly), MemoryOperation::Load, fp32(1, 4), SHAPE)
        .run()
        .unwrap();
    assert!(max.0.starts_with("if(y + 0 < t_dim1xdim2)\n{\n"));
}

#[test]
fn test_buffer_y_clamp_to_border() {
    let (load, _) = Case::new(buffer(Mode::ClampToBorder), MemoryOperation::Load, fp32(1, 4), SHAPE)
        .run()
        .unwrap();
    assert!(load.ends_with("}\nelse\n{\na = 0;\n}\n"), "{}", load);

    let (store, _) =
        Case::new(buffer(Mode::ClampToBorder), MemoryOperation::Store, fp32(1, 4), SHAPE)
            .run()
            .unwrap();
    assert!(!store.contains("else"));
    assert!(store.ends_with("));\n}\n"));

    let (max_only, _) = Case::new(
        buffer(Mode::ClampToBorderMaxEdgeOnly),
        MemoryOperation::Load,
        fp32(1, 4),
        SHAPE,
    )
    .run()
    .unwrap();
    assert!(max_only.starts_with("if(y + 0 < t_dim1xdim2)\n{\n"));
    assert!(max_only.ends_with("else\n{\na = 0;\n}\n"));
}

#[test]
fn test_buffer_y_coordinate_clamps() {
    let nearest = Case::new(buffer(Mode::ClampToNearest), MemoryOperation::Load, fp32(1, 4), SHAPE)
        .run()
        .unwrap()
        .0;
    assert_eq!(
        nearest,
        "a = vload4(0, (__global float*)(t_ptr + (x) * sizeof(float) \
         + (clamp(y + 0, 0, t_dim1xdim2 - 1)) * t_stride1));\n"
    );
    let max = Case::new(buffer(Mode::ClampToMaxEdgeOnly), MemoryOperation::Load, fp32(1, 4), SHAPE)
        .run()
        .unwrap()
        .0;
    assert!(max.contains("(min(y + 0, t_dim1xdim2 - 1)) * t_stride1"));
    let min = Case::new(buffer(Mode::ClampToMinEdgeOnly), MemoryOperation::Load, fp32(1, 4), SHAPE)
        .run()
        .unwrap();
    assert!(min.0.contains("(max(y + 0, 0)) * t_stride1"));
    assert_eq!(min.1, vec!["t_ptr", "t_stride1"]);
}

#[test]
fn test_buffer_overlapping_min() {
    let sampler = buffer(Mode::None).with_address_mode_x(TensorSamplerAddressModeX::OverlappingMin);
    let (code, _) = Case::new(sampler, MemoryOperation::Load, fp32(1, 4), [6, 10, 20, 1, 1])
        .run()
        .unwrap();
    assert_eq!(
        code,
        "if(x > 0)\n{\n\
         a = vload4(0, (__global float*)(t_ptr + (x) * sizeof(float) + (y + 0) * t_stride1));\n\
         }\nelse\n{\n\
         a.s01 = vload2(0, (__global float*)(t_ptr + (x + 0) * sizeof(float) + (y + 0) * t_stride1));\n\
         }\n"
    );
}

#[test]
fn test_buffer_overlapping_min_multi_chunk() {
    let sampler = buffer(Mode::Skip).with_address_mode_x(TensorSamplerAddressModeX::OverlappingMin);
    let (code, _) = Case::new(sampler, MemoryOperation::Store, fp32(2, 8), [13, 10, 20, 1, 1])
        .run()
        .unwrap();
    // 13 % 8 = 5 = 4 + 1, each chunk of each row gets its own Y guard.
    assert!(code.starts_with("if(x > 0)\n{\n"));
    assert_eq!(code.matches("if((y + 0 >= 0)").count(), 3);
    assert_eq!(code.matches("if((y + 1 >= 0)").count(), 3);
    assert!(code.contains("vstore4(a__0.s0123, 0, (__global float*)(t_ptr + (x + 0) * sizeof(float)"));
    assert!(code.contains("*((__global float*)(t_ptr + (x + 4) * sizeof(float) + (y + 1) * t_stride1)) = a__1.s4;\n"));
    assert!(code.ends_with("}\n}\n"));
}

#[test]
fn test_buffer_overlapping_min_without_leftover() {
    let sampler = buffer(Mode::None).with_address_mode_x(TensorSamplerAddressModeX::OverlappingMin);
    let (code, _) = Case::new(sampler, MemoryOperation::Load, fp32(1, 4), [16, 10, 20, 1, 1])
        .run()
        .unwrap();
    assert!(!code.contains("if"));
}

#[test]
fn test_buffer_overlapping_min_dynamic_dim0() {
    let sampler = buffer(Mode::None).with_address_mode_x(TensorSamplerAddressModeX::OverlappingMin);
    let err = Case::new(sampler, MemoryOperation::Load, fp32(1, 4), [-1, 10, 20, 1, 1])
        .run()
        .unwrap_err();
    assert!(matches!(err, KernelWriterError::Unsupported { .. }));
}

#[test]
fn test_buffer_guard_nesting_order() {
    let sampler = TensorSampler::default()
        .with_format(TensorSamplerFormat::Dim0_Dim1_Dim2)
        .with_address_mode_x(TensorSamplerAddressModeX::OverlappingMin)
        .with_address_mode_y(Mode::SkipMinEdgeOnly)
        .with_address_mode_z(Mode::ClampToBorderMaxEdgeOnly);
    let mut case = Case::new(sampler, MemoryOperation::Load, fp32(1, 4), [5, 10, 20, 1, 1]);
    case.z = "z";
    let (code, _) = case.run().unwrap();
    let x_guard = code.find("if(x > 0)").unwrap();
    let z_guard = code.find("if(z < t_dim2)").unwrap();
    let y_guard = code.find("if(y + 0 >= 0)").unwrap();
    assert!(x_guard < z_guard && z_guard < y_guard);
    // The Z else-branch zero-fills the whole tile, in both X paths.
    assert_eq!(code.matches("else\n{\na = 0;\n}\n").count(), 2);
}

#[test]
fn test_buffer_store_z_border_has_no_else() {
    let sampler = TensorSampler::default()
        .with_format(TensorSamplerFormat::Dim0_Dim1_Dim2)
        .with_address_mode_z(Mode::ClampToBorder);
    let mut store = Case::new(sampler, MemoryOperation::Store, fp32(2, 4), [16, 10, 20, 1, 1]);
    store.z = "z";
    let (code, _) = store.run().unwrap();
    assert!(code.starts_with("if((z >= 0) && (z < t_dim2))\n{\n"));
    assert_eq!(code.matches("vstore4(").count(), 2);
    assert!(!code.contains("else"));
    assert!(!code.contains("= 0;"));
    assert!(code.ends_with(";\n}\n"));
    assert_eq!(code.matches('}').count(), 1);

    // The same sampler on a load zero-fills every row.
    let mut load = Case::new(sampler, MemoryOperation::Load, fp32(2, 4), [16, 10, 20, 1, 1]);
    load.z = "z";
    let (code, _) = load.run().unwrap();
    assert!(code.ends_with("}\nelse\n{\na__0 = 0;\na__1 = 0;\n}\n"));
}

#[test]
fn test_buffer_z_clamp_rewrites_coordinate() {
    let sampler = TensorSampler::default()
        .with_format(TensorSamplerFormat::Dim0_Dim1_Dim2)
        .with_address_mode_z(Mode::ClampToNearest);
    let mut case = Case::new(sampler, MemoryOperation::Load, fp32(1, 4), [16, 10, 20, 1, 1]);
    case.z = "z";
    let (code, _) = case.run().unwrap();
    assert!(code.contains("+ (clamp(z, 0, t_dim2 - 1)) * t_stride2"));
}

// ── image2d ──

fn image(storage: TensorStorageType, y: Mode) -> TensorSampler {
    TensorSampler::default()
        .with_storage(storage)
        .with_address_mode_y(y)
}

#[test]
fn test_image2d_load() {
    let (code, params) = Case::new(
        image(TensorStorageType::Texture2dReadOnly, Mode::None),
        MemoryOperation::Load,
        fp32(1, 4),
        SHAPE,
    )
    .run()
    .unwrap();
    assert_eq!(
        code,
        "a = read_imagef(t_img2d, CLK_NORMALIZED_COORDS_FALSE | CLK_ADDRESS_NONE | CLK_FILTER_NEAREST, \
         (int2)((x) >> 2, (y + 0)));\n"
    );
    assert_eq!(params, vec!["t_img2d"]);
}

#[test]
fn test_image2d_store_half() {
    let (code, _) = Case::new(
        image(TensorStorageType::Texture2dWriteOnly, Mode::ClampToBorder),
        MemoryOperation::Store,
        TileInfo::new(DataType::Fp16, 2, 4),
        SHAPE,
    )
    .run()
    .unwrap();
    assert_eq!(
        code,
        "write_imageh(t_img2d, (int2)((x) >> 2, (y + 0)), a__0);\n\
         write_imageh(t_img2d, (int2)((x) >> 2, (y + 1)), a__1);\n"
    );
}

#[test]
fn test_image2d_skip_guard_and_sampler() {
    let (code, _) = Case::new(
        image(TensorStorageType::Texture2dReadOnly, Mode::SkipMinEdgeOnly),
        MemoryOperation::Load,
        fp32(1, 4),
        SHAPE,
    )
    .run()
    .unwrap();
    assert!(code.starts_with("if(y + 0 >= 0)\n{\n"));
    assert!(code.contains("CLK_ADDRESS_CLAMP |"));
    assert!(code.ends_with(";\n}\n"));

    let (edge, _) = Case::new(
        image(TensorStorageType::Texture2dReadOnly, Mode::ClampToNearest),
        MemoryOperation::Load,
        fp32(1, 4),
        SHAPE,
    )
    .run()
    .unwrap();
    assert!(edge.contains("CLK_ADDRESS_CLAMP_TO_EDGE"));
    assert!(!edge.contains("if"));
}

#[test]
fn test_image2d_folds_z_and_batch_into_y() {
    let mut case = Case::new(
        image(TensorStorageType::Texture2dReadOnly, Mode::None)
            .with_format(TensorSamplerFormat::Dim0_Dim1_Dim2),
        MemoryOperation::Load,
        fp32(1, 4),
        [16, 10, 4, 2, 1],
    );
    case.z = "z";
    case.batch = "b";
    let (code, _) = case.run().unwrap();
    assert!(code.contains("(int2)((x) >> 2, (y + 0 + (z) * t_dim1 + (b) * t_dim1 * t_dim2))"));
}

#[test]
fn test_image2d_validation() {
    let wrong_width = Case::new(
        image(TensorStorageType::Texture2dReadOnly, Mode::None),
        MemoryOperation::Load,
        fp32(1, 8),
        SHAPE,
    )
    .run();
    assert!(matches!(wrong_width, Err(KernelWriterError::Precondition(_))));

    let wrong_direction = Case::new(
        image(TensorStorageType::Texture2dReadOnly, Mode::None),
        MemoryOperation::Store,
        fp32(1, 4),
        SHAPE,
    )
    .run();
    assert!(matches!(wrong_direction, Err(KernelWriterError::Precondition(_))));

    let wrong_type = Case::new(
        image(TensorStorageType::Texture2dReadOnly, Mode::None),
        MemoryOperation::Load,
        TileInfo::new(DataType::Int32, 1, 4),
        SHAPE,
    )
    .run();
    assert!(matches!(wrong_type, Err(KernelWriterError::Precondition(_))));

    let wrong_x = Case::new(
        image(TensorStorageType::Texture2dReadOnly, Mode::None)
            .with_address_mode_x(TensorSamplerAddressModeX::OverlappingMin),
        MemoryOperation::Load,
        fp32(1, 4),
        SHAPE,
    )
    .run();
    assert!(matches!(wrong_x, Err(KernelWriterError::Precondition(_))));
}

// ── guard rendering ──

#[test]
fn test_guard_condition_evaluates_max_lazily() {
    let cond = guard_condition(Mode::SkipMinEdgeOnly, "c", || {
        panic!("max must not be evaluated")
    })
    .unwrap();
    assert_eq!(cond.as_deref(), Some("c >= 0"));
    assert_eq!(
        guard_condition(Mode::ClampToNearest, "c", || Ok("m".to_string())).unwrap(),
        None
    );
    assert_eq!(
        clamp_coordinate(Mode::Skip, "c", || Ok("m".to_string())).unwrap(),
        "c"
    );
}
